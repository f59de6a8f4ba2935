//! Form validation.
//!
//! Every check here runs before the store or the API is touched.

use secrecy::{ExposeSecret, SecretString};

use booknest_core::Email;

use crate::error::{MIN_PASSWORD_LENGTH, ValidationError};
use crate::models::{BookDraft, PaymentCard, ShippingAddress};

/// Parse and normalize an e-mail address.
///
/// # Errors
///
/// Returns `ValidationError::MissingField` for blank input and
/// `ValidationError::InvalidEmail` otherwise.
pub fn validate_email(raw: &str) -> Result<Email, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::MissingField("Email"));
    }
    Ok(Email::parse(raw)?)
}

/// A trimmed, non-empty display name.
///
/// # Errors
///
/// Returns `ValidationError::MissingField` for blank input.
pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField("Name"));
    }
    Ok(name.to_string())
}

/// # Errors
///
/// Returns `ValidationError::PasswordTooShort` below the minimum length.
pub fn validate_password(password: &SecretString) -> Result<(), ValidationError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Validate a new password and its confirmation.
///
/// # Errors
///
/// Returns `ValidationError::PasswordMismatch` or `PasswordTooShort`.
pub fn validate_new_password(
    password: &SecretString,
    confirmation: &SecretString,
) -> Result<(), ValidationError> {
    if password.expose_secret() != confirmation.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    validate_password(password)
}

/// All eight shipping fields must be filled and the e-mail well formed.
///
/// # Errors
///
/// Returns the first failing field.
pub fn validate_shipping(address: &ShippingAddress) -> Result<(), ValidationError> {
    let fields = [
        ("First name", &address.first_name),
        ("Last name", &address.last_name),
        ("Email", &address.email),
        ("Phone", &address.phone),
        ("Address", &address.address),
        ("City", &address.city),
        ("State", &address.state),
        ("ZIP code", &address.zip_code),
    ];
    for (label, value) in fields {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(label));
        }
    }
    Email::parse(&address.email)?;
    Ok(())
}

/// # Errors
///
/// Returns the first failing card field.
pub fn validate_card(card: &PaymentCard) -> Result<(), ValidationError> {
    if card.name.trim().is_empty() {
        return Err(ValidationError::MissingField("Name on card"));
    }
    if card.number.trim().is_empty() {
        return Err(ValidationError::MissingField("Card number"));
    }
    let digits = card.digits();
    let only_digits_and_separators = card
        .number
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
    if !only_digits_and_separators || !(12..=19).contains(&digits.len()) {
        return Err(ValidationError::InvalidCardNumber);
    }
    if card.expiry.trim().is_empty() {
        return Err(ValidationError::MissingField("Expiry"));
    }
    if !is_valid_expiry(card.expiry.trim()) {
        return Err(ValidationError::InvalidExpiry);
    }
    if card.cvc.trim().is_empty() {
        return Err(ValidationError::MissingField("CVC"));
    }
    let cvc = card.cvc.trim();
    if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidCvc);
    }
    Ok(())
}

fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let month_ok = month.len() == 2 && month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m));
    let year_ok = year.len() == 2 && year.chars().all(|c| c.is_ascii_digit());
    month_ok && year_ok
}

/// Validate and normalize an admin book form.
///
/// Text fields are trimmed and a missing original price defaults to the
/// price.
///
/// # Errors
///
/// Returns the first failing field.
pub fn validate_book_draft(mut draft: BookDraft) -> Result<BookDraft, ValidationError> {
    for (label, value) in [
        ("Name", &mut draft.name),
        ("Author", &mut draft.author),
        ("Category", &mut draft.category),
        ("Image", &mut draft.image),
        ("Description", &mut draft.description),
    ] {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField(label));
        }
        *value = trimmed.to_string();
    }
    if !draft.price.is_positive() {
        return Err(ValidationError::InvalidPrice);
    }
    if draft.discount.is_some_and(|d| d > 100) {
        return Err(ValidationError::InvalidDiscount);
    }
    if draft.rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
        return Err(ValidationError::InvalidRating);
    }
    if draft.original_price.is_none() {
        draft.original_price = Some(draft.price);
    }
    Ok(draft)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use booknest_core::{EmailError, Money};

    use super::*;
    use crate::testing::{card, shipping};

    #[test]
    fn test_email() {
        assert_eq!(
            validate_email("  reader@booknest.dev ").unwrap().as_str(),
            "reader@booknest.dev"
        );
        assert_eq!(validate_email(" "), Err(ValidationError::MissingField("Email")));
        assert_eq!(
            validate_email("reader"),
            Err(ValidationError::InvalidEmail(EmailError::MissingAtSymbol))
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password(&SecretString::from("12345")).is_err());
        assert!(validate_password(&SecretString::from("123456")).is_ok());
        assert_eq!(
            validate_new_password(&SecretString::from("abcdef"), &SecretString::from("abcdeg")),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_new_password(&SecretString::from("abc"), &SecretString::from("abc")),
            Err(ValidationError::PasswordTooShort)
        );
    }

    #[test]
    fn test_shipping_requires_every_field() {
        assert!(validate_shipping(&shipping()).is_ok());

        let mut address = shipping();
        address.zip_code = "  ".to_string();
        assert_eq!(
            validate_shipping(&address),
            Err(ValidationError::MissingField("ZIP code"))
        );

        let mut address = shipping();
        address.email = "not-an-email".to_string();
        assert!(matches!(
            validate_shipping(&address),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_card_rules() {
        assert!(validate_card(&card()).is_ok());

        let mut c = card();
        c.number = "4111".to_string();
        assert_eq!(validate_card(&c), Err(ValidationError::InvalidCardNumber));

        let mut c = card();
        c.number = "4111-1111-abcd-1111".to_string();
        assert_eq!(validate_card(&c), Err(ValidationError::InvalidCardNumber));

        let mut c = card();
        c.expiry = "13/29".to_string();
        assert_eq!(validate_card(&c), Err(ValidationError::InvalidExpiry));

        let mut c = card();
        c.cvc = "12".to_string();
        assert_eq!(validate_card(&c), Err(ValidationError::InvalidCvc));

        let mut c = card();
        c.name.clear();
        assert_eq!(validate_card(&c), Err(ValidationError::MissingField("Name on card")));
    }

    fn draft() -> BookDraft {
        BookDraft {
            name: " Dune ".to_string(),
            author: "Frank Herbert".to_string(),
            price: Money::from_cents(1099),
            category: "Sci-Fi".to_string(),
            image: "dune.jpg".to_string(),
            description: "Spice".to_string(),
            ..BookDraft::default()
        }
    }

    #[test]
    fn test_book_draft_normalizes() {
        let draft = validate_book_draft(draft()).unwrap();
        assert_eq!(draft.name, "Dune");
        assert_eq!(draft.original_price, Some(Money::from_cents(1099)));
    }

    #[test]
    fn test_book_draft_rejects() {
        let mut d = draft();
        d.price = Money::ZERO;
        assert_eq!(validate_book_draft(d), Err(ValidationError::InvalidPrice));

        let mut d = draft();
        d.author.clear();
        assert_eq!(validate_book_draft(d), Err(ValidationError::MissingField("Author")));

        let mut d = draft();
        d.discount = Some(120);
        assert_eq!(validate_book_draft(d), Err(ValidationError::InvalidDiscount));
    }
}
