//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases so signatures say which table they point at:
//!
//! - [`UserId`], [`CreatorId`]: account identifiers
//! - [`MessageId`], [`SubscriptionId`], [`ContentRequestId`], [`StoryId`], [`GalleryPhotoId`],
//!   [`AiDoubleId`]: row identifiers
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging
//! - [`slugify`]: Lowercase, dash-separated slug for share links
//!
//! # Text-backed enums
//!
//! Status-like columns are stored as `TEXT` with a `CHECK` constraint. [`text_enum!`] gives an
//! enum the string conversions needed to bind it as a query parameter and to decode it from a
//! row with `#[sqlx(try_from = "String")]`.

use uuid::Uuid;

pub type UserId = Uuid;
pub type CreatorId = Uuid;
pub type MessageId = Uuid;
pub type SubscriptionId = Uuid;
pub type ContentRequestId = Uuid;
pub type StoryId = Uuid;
pub type GalleryPhotoId = Uuid;
pub type AiDoubleId = Uuid;

/// A stored string that does not name any variant of the target enum.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implement `as_str`, `Display`, `FromStr` and `TryFrom<String>` for a fieldless enum whose
/// variants map one-to-one onto lowercase strings.
#[macro_export]
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::types::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::types::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::types::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Turn free text into a URL slug: ASCII alphanumerics are kept (lowercased), every other run of
/// characters collapses into a single `-`, and leading/trailing dashes are dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Normalize an email address for lookups and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id: Uuid = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_slugify() {
        let cases = vec![
            ("My Voice", "my-voice"),
            ("  Hello,   World!! ", "hello-world"),
            ("already-a-slug", "already-a-slug"),
            ("Émile's double", "mile-s-double"),
            ("---", ""),
        ];

        for (input, expected) in cases {
            assert_eq!(slugify(input), expected, "Failed for input: {input}");
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Someone@Example.COM "), "someone@example.com");
    }
}
