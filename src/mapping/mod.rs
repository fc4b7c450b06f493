pub mod extend;
pub mod flatten;

pub use extend::*;
pub use flatten::*;

/// Separator used in dotted mapping paths (`donor.age`)
pub const PATH_SEPARATOR: &str = ".";

/// Separator used in SDL identifiers in place of `.` (`donor__age`)
pub const GQL_SEPARATOR: &str = "__";

/// Convert a dotted mapping path into an SDL-safe field identifier
pub fn sanitize_field_name(path: &str) -> String {
    path.replace(PATH_SEPARATOR, GQL_SEPARATOR)
}

/// Inverse of [`sanitize_field_name`]
pub fn unsanitize_field_name(gql_field: &str) -> String {
    gql_field.replace(GQL_SEPARATOR, PATH_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_roundtrip() {
        assert_eq!(sanitize_field_name("donor.diagnosis.age"), "donor__diagnosis__age");
        assert_eq!(unsanitize_field_name("donor__diagnosis__age"), "donor.diagnosis.age");
        assert_eq!(sanitize_field_name("status"), "status");
    }
}
