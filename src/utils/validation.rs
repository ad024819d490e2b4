use crate::utils::error::{CrosswordError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CrosswordError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CrosswordError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CrosswordError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CrosswordError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CrosswordError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(CrosswordError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CrosswordError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CrosswordError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_formats(field_name: &str, formats: &[String], allowed: &[&str]) -> Result<()> {
    if formats.is_empty() {
        return Err(CrosswordError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    for format in formats {
        if !allowed.contains(&format.as_str()) {
            return Err(CrosswordError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format.clone(),
                reason: format!("Unsupported format. Valid formats: {}", allowed.join(", ")),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("generator.endpoint", "http://localhost:11434").is_ok());
        assert!(validate_url("generator.endpoint", "https://example.com").is_ok());
        assert!(validate_url("generator.endpoint", "").is_err());
        assert!(validate_url("generator.endpoint", "invalid-url").is_err());
        assert!(validate_url("generator.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("layout.max_rows", 50, 3, 200).is_ok());
        assert!(validate_range("layout.max_rows", 2, 3, 200).is_err());
        assert!(validate_range("layout.max_rows", 201, 3, 200).is_err());
    }

    #[test]
    fn test_validate_formats() {
        let formats = vec!["text".to_string(), "json".to_string()];
        assert!(validate_formats("output.formats", &formats, &["text", "json", "csv"]).is_ok());

        let invalid = vec!["pdf".to_string()];
        assert!(validate_formats("output.formats", &invalid, &["text", "json", "csv"]).is_err());
        assert!(validate_formats("output.formats", &[], &["text"]).is_err());
    }
}
