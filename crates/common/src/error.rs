use thiserror::Error;

/// A CMS document that cannot be turned into one of our types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("document is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Request body rejected before it reaches the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Brand and name are required")]
    MissingRequired { fields: Vec<&'static str> },

    #[error("{0} is required")]
    Required(&'static str),

    #[error("All fields are required")]
    AllFieldsRequired,
}
