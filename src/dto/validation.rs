//! Validation helpers for DTOs.

use indexmap::IndexMap;
use serde_json::Value;
use validator::ValidationError;

/// Maximum number of keys a single metadata submission may carry.
pub const MAX_METADATA_ENTRIES: usize = 64;
/// Maximum length of a metadata key.
pub const MAX_METADATA_KEY_LEN: usize = 128;

/// Validates that a display name is not blank once surrounding whitespace is removed.
///
/// ```ignore
/// validate_display_name("Ada")   // Ok
/// validate_display_name("   ")   // Err - blank
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Display name must contain a visible character".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a metadata submission: between 1 and [`MAX_METADATA_ENTRIES`] keys, none blank
/// or longer than [`MAX_METADATA_KEY_LEN`].
pub fn validate_metadata_entries(entries: &IndexMap<String, Value>) -> Result<(), ValidationError> {
    if entries.is_empty() || entries.len() > MAX_METADATA_ENTRIES {
        let mut err = ValidationError::new("metadata_entry_count");
        err.message = Some(
            format!(
                "Metadata must contain between 1 and {MAX_METADATA_ENTRIES} entries (got {})",
                entries.len()
            )
            .into(),
        );
        return Err(err);
    }

    if entries
        .keys()
        .any(|key| key.trim().is_empty() || key.len() > MAX_METADATA_KEY_LEN)
    {
        let mut err = ValidationError::new("metadata_key_format");
        err.message = Some(
            format!("Metadata keys must be non-blank and at most {MAX_METADATA_KEY_LEN} bytes")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Ada").is_ok());
        assert!(validate_display_name(" Bob ").is_ok());
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("  \t").is_err());
    }

    #[test]
    fn test_validate_metadata_entries_count() {
        let mut entries = IndexMap::new();
        assert!(validate_metadata_entries(&entries).is_err()); // empty

        entries.insert("lang".to_string(), Value::from("de"));
        assert!(validate_metadata_entries(&entries).is_ok());

        for i in 0..MAX_METADATA_ENTRIES {
            entries.insert(format!("k{i}"), Value::from(i));
        }
        assert!(validate_metadata_entries(&entries).is_err()); // too many
    }

    #[test]
    fn test_validate_metadata_entries_keys() {
        let mut entries = IndexMap::new();
        entries.insert(" ".to_string(), Value::Null);
        assert!(validate_metadata_entries(&entries).is_err());

        let mut entries = IndexMap::new();
        entries.insert("x".repeat(MAX_METADATA_KEY_LEN + 1), Value::Null);
        assert!(validate_metadata_entries(&entries).is_err());
    }
}
