use crate::schema::{FieldSpec, ResourceSchema};

/// Stored password hash
pub const HASHED_PASSWORD: &str = "hashedPassword";
/// Session key embedded in issued bearer tokens; rotated on sign-in and sign-out
pub const SESSION_TOKEN: &str = "token";

/// Accounts own themselves and are created through `/sign-up`, never through
/// the generic create route.
pub fn schema() -> ResourceSchema {
    ResourceSchema::new(
        "user",
        "users",
        vec![
            FieldSpec::string("email").required().unique(),
            FieldSpec::string(HASHED_PASSWORD).required().internal(),
            FieldSpec::string(SESSION_TOKEN).internal(),
        ],
    )
    .self_owned()
}
