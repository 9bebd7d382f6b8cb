//! ACL user record.

use std::collections::HashMap;

/// Capacity of the `allowed_commands` bit array. A command ID at or
/// beyond this bound cannot be recorded and is denied at authorization
/// time (see `authorize.rs`).
pub const MAX_CMD_BITS: usize = 1024;

const BITS_PER_WORD: usize = 64;
const WORDS: usize = MAX_CMD_BITS / BITS_PER_WORD;

/// Per-user boolean flags. Kept as a bitset (not four separate `bool`s)
/// to mirror the C source's packed representation and because several
/// invariants (ALLKEYS<=>patterns, NOPASS<=>passwords) are phrased in
/// terms of these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserFlags(u8);

impl UserFlags {
    pub const ENABLED: UserFlags = UserFlags(1 << 0);
    pub const ALLKEYS: UserFlags = UserFlags(1 << 1);
    pub const ALLCOMMANDS: UserFlags = UserFlags(1 << 2);
    pub const NOPASS: UserFlags = UserFlags(1 << 3);

    pub fn contains(self, flag: UserFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn set(&mut self, flag: UserFlags) {
        self.0 |= flag.0;
    }

    pub fn clear(&mut self, flag: UserFlags) {
        self.0 &= !flag.0;
    }
}

/// Fixed-size bit array over command IDs, two cache lines wide at
/// `MAX_CMD_BITS = 1024`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBits([u64; WORDS]);

impl CommandBits {
    pub fn new() -> Self {
        Self([0u64; WORDS])
    }

    fn word_and_bit(id: u64) -> Option<(usize, u64)> {
        let id = id as usize;
        if id >= MAX_CMD_BITS {
            return None;
        }
        let wordid = id / BITS_PER_WORD;
        let bit = 1u64 << (id % BITS_PER_WORD);
        Some((wordid, bit))
    }

    /// Set the bit for `id`. No-op if `id` is out of range.
    pub fn set(&mut self, id: u64) {
        if let Some((w, b)) = Self::word_and_bit(id) {
            self.0[w] |= b;
        }
    }

    /// Clear the bit for `id`. No-op if `id` is out of range.
    pub fn clear(&mut self, id: u64) {
        if let Some((w, b)) = Self::word_and_bit(id) {
            self.0[w] &= !b;
        }
    }

    /// Test the bit for `id`. Out-of-range IDs read as unset.
    pub fn get(&self, id: u64) -> bool {
        match Self::word_and_bit(id) {
            Some((w, b)) => self.0[w] & b != 0,
            None => false,
        }
    }

    pub fn set_all(&mut self) {
        self.0 = [u64::MAX; WORDS];
    }

    pub fn clear_all(&mut self) {
        self.0 = [0u64; WORDS];
    }
}

impl Default for CommandBits {
    fn default() -> Self {
        Self::new()
    }
}

/// A single user in the ACL system.
///
/// Construction always starts from the all-zero/empty state; `reset()`
/// restores exactly that state.
#[derive(Debug, Clone)]
pub struct AclUser {
    pub(crate) name: String,
    pub(crate) flags: UserFlags,
    pub(crate) passwords: Vec<Vec<u8>>,
    pub(crate) patterns: Vec<Vec<u8>>,
    pub(crate) allowed_commands: CommandBits,
    pub(crate) allowed_subcommands: HashMap<u64, Vec<String>>,
}

impl AclUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: UserFlags::default(),
            passwords: Vec::new(),
            patterns: Vec::new(),
            allowed_commands: CommandBits::new(),
            allowed_subcommands: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> UserFlags {
        self.flags
    }

    pub fn enabled(&self) -> bool {
        self.flags.contains(UserFlags::ENABLED)
    }

    pub fn has_allkeys(&self) -> bool {
        self.flags.contains(UserFlags::ALLKEYS)
    }

    pub fn has_allcommands(&self) -> bool {
        self.flags.contains(UserFlags::ALLCOMMANDS)
    }

    pub fn has_nopass(&self) -> bool {
        self.flags.contains(UserFlags::NOPASS)
    }

    pub fn passwords(&self) -> &[Vec<u8>] {
        &self.passwords
    }

    pub fn patterns(&self) -> &[Vec<u8>] {
        &self.patterns
    }

    pub fn command_allowed_bit(&self, id: u64) -> bool {
        self.allowed_commands.get(id)
    }

    pub fn subcommand_allowed(&self, cmd_id: u64, sub: &str) -> bool {
        self.allowed_subcommands
            .get(&cmd_id)
            .is_some_and(|subs| subs.iter().any(|s| s.eq_ignore_ascii_case(sub)))
    }

    /// Reset to a newly-constructed user's state: disabled, no
    /// passwords, no patterns, no commands.
    pub fn reset(&mut self) {
        self.flags = UserFlags::default();
        self.passwords.clear();
        self.patterns.clear();
        self.allowed_commands.clear_all();
        self.allowed_subcommands.clear();
    }
}
