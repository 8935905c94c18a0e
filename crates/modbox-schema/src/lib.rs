//! Mod definitions, profiles, and content hashing for modbox.
//!
//! This crate defines the schema layer: TOML mod documents (`ModDefinition`),
//! the validated `Mod` they normalize into, the `Profile` a user edits, blake3
//! hashing for artifacts and profile content, the built-in mod table compiled
//! into the binary, and profile templates.

pub mod builtin;
pub mod definition;
pub mod identity;
pub mod normalize;
pub mod preset;
pub mod profile;
pub mod types;

pub use builtin::{get_builtin, BuiltinMod, BUILTIN_MODS};
pub use definition::{parse_definition_file, parse_definition_str, DefinitionError, ModDefinition};
pub use identity::{content_hash, digest};
pub use normalize::Mod;
pub use preset::{get_preset, list_presets, Preset, BUILTIN_PRESETS};
pub use profile::{
    BuildMetadata, Profile, ProfileError, ProfileScope, BASE_IMAGE_NAME, PROFILE_VERSION,
};
pub use types::{ArtifactDigest, ContentHash, ModId, CORE_CATEGORY, OS_CATEGORY};
