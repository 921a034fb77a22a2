//! Message catalog for user-facing error text.
//!
//! Domain violations carry a message key (for example
//! `movement.validate.closed-financial-period`); the catalog resolves the key
//! to a display template with `{0}`-style placeholders. Unknown keys resolve
//! to the key itself so a missing translation never hides the violation.

use std::collections::HashMap;

use config::{Config, File};

use crate::{EngineError, ResultEngine};

const DEFAULT_CATALOG: &[(&str, &str)] = &[
    (
        "cost-center.validate.duplicated",
        "A cost center with this name already exists under the same parent",
    ),
    (
        "movement-class.validate.duplicated",
        "A class with this name and type already exists in the cost center",
    ),
    (
        "movement-class.validate.no-budget",
        "Budget exceeded: only {0} is still available in the cost center",
    ),
    (
        "movement.validate.empty-apportionment",
        "The movement has no apportionments",
    ),
    (
        "movement.validate.apportionment-value",
        "Apportionments do not match the movement value, difference of {0}",
    ),
    (
        "movement.validate.closed-financial-period",
        "The financial period of this movement is already closed",
    ),
    (
        "movement.validate.has-card-invoice",
        "The movement belongs to a paid card invoice and cannot be deleted",
    ),
    (
        "movement.validate.already-paid",
        "The movement is already paid",
    ),
    (
        "payment.validate.missing-wallet",
        "Cash payments require a wallet",
    ),
    (
        "payment.validate.missing-card",
        "Card payments require a card",
    ),
    (
        "wallet.validate.duplicated",
        "A wallet with this name already exists",
    ),
    (
        "card.validate.duplicated",
        "A card with this name and type already exists",
    ),
    (
        "card.validate.no-wallet",
        "Debit cards must be linked to a wallet",
    ),
    (
        "card-invoice.validate.duplicated",
        "An invoice for this card and period already exists",
    ),
    (
        "card-invoice.validate.empty",
        "There are no movements to invoice for this card and period",
    ),
    (
        "financial-period.validate.duplicated",
        "A financial period with this identification already exists",
    ),
    (
        "financial-period.validate.invalid-dates",
        "The period start must come before its end",
    ),
    (
        "financial-period.validate.overlap",
        "The period overlaps an open financial period",
    ),
    (
        "financial-period.validate.already-closed",
        "The financial period is already closed",
    ),
    (
        "financial-period.validate.open-movements",
        "The period still has {0} open movements",
    ),
    (
        "fixed-movement.validate.finished",
        "The fixed movement already launched all its installments",
    ),
    (
        "user.validate.duplicated",
        "A user with this username already exists",
    ),
];

/// Resolves message keys to user-facing text.
#[derive(Clone, Debug)]
pub struct MessageSource {
    templates: HashMap<String, String>,
}

impl Default for MessageSource {
    fn default() -> Self {
        let templates = DEFAULT_CATALOG
            .iter()
            .map(|(key, text)| (key.to_string(), text.to_string()))
            .collect();
        Self { templates }
    }
}

impl MessageSource {
    /// Loads the embedded catalog and applies overrides from a TOML file.
    ///
    /// The file is flat, with quoted dotted keys:
    ///
    /// ```toml
    /// "wallet.validate.duplicated" = "Nome di portafoglio già in uso"
    /// ```
    pub fn from_file(path: &str) -> ResultEngine<Self> {
        let overrides: HashMap<String, String> = Config::builder()
            .add_source(File::with_name(path))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|err| EngineError::InvalidValue(format!("message catalog: {err}")))?;

        let mut source = Self::default();
        source.templates.extend(overrides);
        Ok(source)
    }

    /// Resolves a key, substituting `{0}`, `{1}`, ... with `args`.
    ///
    /// Unknown keys resolve to the key itself.
    pub fn resolve(&self, key: &str, args: &[String]) -> String {
        let template = self.templates.get(key).map(String::as_str).unwrap_or(key);
        let mut text = template.to_string();
        for (index, arg) in args.iter().enumerate() {
            text = text.replace(&format!("{{{index}}}"), arg);
        }
        text
    }

    /// Display text for an engine error.
    ///
    /// Domain violations go through the catalog; everything else uses the
    /// error's own display form.
    pub fn describe(&self, error: &EngineError) -> String {
        match error {
            EngineError::DomainViolation { key, args } => self.resolve(key, args),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_key() {
        let source = MessageSource::default();
        assert_eq!(
            source.resolve("movement.validate.empty-apportionment", &[]),
            "The movement has no apportionments"
        );
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        let source = MessageSource::default();
        assert_eq!(
            source.resolve("movement.validate.unknown-rule", &[]),
            "movement.validate.unknown-rule"
        );
    }

    #[test]
    fn substitutes_placeholders() {
        let source = MessageSource::default();
        let text = source.resolve(
            "movement-class.validate.no-budget",
            &["120.00".to_string()],
        );
        assert_eq!(
            text,
            "Budget exceeded: only 120.00 is still available in the cost center"
        );
    }

    #[test]
    fn describes_violations_through_catalog() {
        let source = MessageSource::default();
        let err = EngineError::violation("financial-period.validate.already-closed");
        assert_eq!(
            source.describe(&err),
            "The financial period is already closed"
        );
    }
}
