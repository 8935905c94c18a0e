/// A mod document compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinMod {
    pub id: &'static str,
    pub source: &'static str,
}

macro_rules! builtin {
    ($id:literal) => {
        BuiltinMod {
            id: $id,
            source: include_str!(concat!("../mods/", $id, ".toml")),
        }
    };
}

/// The bundled mod set, sorted by identifier.
pub const BUILTIN_MODS: &[BuiltinMod] = &[
    builtin!("editor/neovim"),
    builtin!("lang/node"),
    builtin!("lang/python"),
    builtin!("lang/rust"),
    builtin!("os/fedora"),
    builtin!("os/ubuntu"),
    builtin!("shell/oh-my-zsh"),
    builtin!("shell/zsh-fedora"),
    builtin!("shell/zsh-ubuntu"),
    builtin!("tools/git"),
    builtin!("tools/homebrew"),
    builtin!("tools/mise"),
];

pub fn get_builtin(id: &str) -> Option<&'static BuiltinMod> {
    BUILTIN_MODS.iter().find(|b| b.id == id)
}
