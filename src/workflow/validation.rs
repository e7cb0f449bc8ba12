use crate::error::{Error, Result};
use crate::workflow::create::CreateAgencyForm;
use crate::workflow::topup::TopUpForm;

pub const EMPTY_TOP_UP: &str = "Please add at least one resource to top up.";

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::Validation(
            "Please enter a valid billing amount.".to_string(),
        ));
    }
    Ok(())
}

/// Local checks before a top-up is allowed to reach the network.
pub fn validate_top_up(form: &TopUpForm) -> Result<()> {
    if form.is_empty() {
        return Err(Error::Validation(EMPTY_TOP_UP.to_string()));
    }
    validate_amount(form.amount)
}

/// Local checks for a new agency registration.
pub fn validate_create_agency(form: &CreateAgencyForm) -> Result<()> {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.phone.trim().is_empty()
    {
        return Err(Error::Validation(
            "Name, email and phone are required.".to_string(),
        ));
    }

    let email = form.email.trim();
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid_email {
        return Err(Error::Validation(format!(
            "'{}' is not a valid email address.",
            email
        )));
    }

    validate_amount(form.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ResourceKind;

    fn create_form() -> CreateAgencyForm {
        CreateAgencyForm {
            name: "Acme".to_string(),
            email: "ops@acme.test".to_string(),
            phone: "555-0100".to_string(),
            ..CreateAgencyForm::default()
        }
    }

    #[test]
    fn test_empty_top_up_rejected() {
        let form = TopUpForm::default();
        let err = validate_top_up(&form).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_TOP_UP);
    }

    #[test]
    fn test_amount_alone_is_not_a_top_up() {
        let form = TopUpForm {
            amount: 50.0,
            ..TopUpForm::default()
        };
        assert!(validate_top_up(&form).is_err());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut form = TopUpForm::default();
        form.set(ResourceKind::Images, 10);
        form.amount = -1.0;
        assert!(validate_top_up(&form).is_err());
        form.amount = f64::NAN;
        assert!(validate_top_up(&form).is_err());
        form.amount = 0.0;
        assert!(validate_top_up(&form).is_ok());
    }

    #[test]
    fn test_create_requires_contact_fields() {
        assert!(validate_create_agency(&create_form()).is_ok());

        let mut form = create_form();
        form.phone = "  ".to_string();
        assert!(validate_create_agency(&form).is_err());
    }

    #[test]
    fn test_create_checks_email_shape() {
        let mut form = create_form();
        for bad in ["acme.test", "@acme.test", "ops@acme", "ops@acme."] {
            form.email = bad.to_string();
            assert!(validate_create_agency(&form).is_err(), "{} accepted", bad);
        }
    }
}
