use serde::Serialize;

/// A starting profile offered by `modbox init --template`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub profile: &'static str,
}

pub const BUILTIN_PRESETS: &[Preset] = &[
    Preset {
        name: "minimal",
        description: "Ubuntu base with git only",
        profile: r#"version = 1
mods = ["os/ubuntu", "tools/git"]
"#,
    },
    Preset {
        name: "dev",
        description: "Ubuntu with zsh, homebrew, mise and neovim",
        profile: r#"version = 1
mods = ["os/ubuntu", "tools/git", "shell/oh-my-zsh", "tools/mise", "editor/neovim"]
passthrough_env = ["GITHUB_TOKEN"]
"#,
    },
    Preset {
        name: "fedora-dev",
        description: "Fedora with zsh, git and mise",
        profile: r#"version = 1
mods = ["os/fedora", "tools/git", "shell/oh-my-zsh", "tools/mise"]
passthrough_env = ["GITHUB_TOKEN"]
"#,
    },
    Preset {
        name: "python",
        description: "Project layer: Python toolchain managed by mise",
        profile: r#"version = 1
mods = ["lang/python"]
"#,
    },
    Preset {
        name: "node",
        description: "Project layer: Node.js toolchain managed by mise",
        profile: r#"version = 1
mods = ["lang/node"]
"#,
    },
    Preset {
        name: "rust",
        description: "Project layer: Rust toolchain via rustup",
        profile: r#"version = 1
mods = ["lang/rust"]
"#,
    },
];

pub fn get_preset(name: &str) -> Option<&'static Preset> {
    BUILTIN_PRESETS.iter().find(|p| p.name == name)
}

pub fn list_presets() -> &'static [Preset] {
    BUILTIN_PRESETS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::BUILTIN_MODS;

    #[test]
    fn all_presets_parse() {
        for preset in BUILTIN_PRESETS {
            let result = crate::Profile::parse_str(preset.profile);
            assert!(
                result.is_ok(),
                "preset '{}' failed to parse: {:?}",
                preset.name,
                result.err()
            );
        }
    }

    #[test]
    fn presets_only_reference_builtin_mods() {
        for preset in BUILTIN_PRESETS {
            let profile = crate::Profile::parse_str(preset.profile).unwrap();
            for id in &profile.mods {
                assert!(
                    BUILTIN_MODS.iter().any(|b| b.id == id.as_str()),
                    "preset '{}' references unknown mod '{id}'",
                    preset.name
                );
            }
        }
    }

    #[test]
    fn get_preset_by_name() {
        assert!(get_preset("dev").is_some());
        assert!(get_preset("nonexistent").is_none());
    }

    #[test]
    fn all_presets_have_unique_names() {
        let mut names: Vec<&str> = BUILTIN_PRESETS.iter().map(|p| p.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_PRESETS.len());
    }
}
