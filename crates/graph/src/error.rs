use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Profile {profile} has no {kind} '{value}'")]
    ProfileMemberNotFound {
        profile: String,
        kind: &'static str,
        value: String,
    },

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Element {0} exists but is not a class")]
    NotAClass(String),

    #[error("Property {property} not found on class {owner}")]
    PropertyNotFound { owner: String, property: String },

    #[error("View {view} references unknown type view '{reference}'")]
    DanglingViewReference { view: String, reference: String },

    #[error("Can't parse multiplicity value '{0}'")]
    InvalidMultiplicity(String),

    #[error("{0}")]
    Other(String),
}
