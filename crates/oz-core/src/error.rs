use thiserror::Error;

/// Rejected numeric input.
#[derive(Error, Debug)]
pub enum OzError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_the_quantity() {
        let err = OzError::OutOfRange {
            what: "weight fraction",
            value: 1.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("weight fraction"));
        assert!(msg.contains("1.5"));
    }
}
