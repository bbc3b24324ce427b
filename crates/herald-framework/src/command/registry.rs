//! Name and alias index of registered commands.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::RegistrationError;

use super::action::BoxedAction;
use super::descriptor::CommandDescriptor;

/// Normalizes a command name or alias: lowercase, whitespace removed.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A descriptor together with its action.
#[derive(Clone)]
pub struct RegisteredCommand {
    pub descriptor: Arc<CommandDescriptor>,
    pub action: BoxedAction,
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("descriptor", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

/// Commands indexed by name and alias.
///
/// Names and aliases form one namespace: no word ever points at two
/// commands.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, RegisteredCommand>,
    /// Name or alias to command name.
    index: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::DuplicateName`] if a command with the same name
    ///   exists
    /// - [`RegistrationError::AliasCollision`] if the name or an alias is
    ///   already used as a name or alias of another command
    pub fn register(
        &mut self,
        descriptor: CommandDescriptor,
        action: BoxedAction,
    ) -> Result<(), RegistrationError> {
        let name = descriptor.name().to_string();
        if self.commands.contains_key(&name) {
            return Err(RegistrationError::DuplicateName(name));
        }
        for word in std::iter::once(&name).chain(descriptor.aliases()) {
            if let Some(existing) = self.index.get(word) {
                return Err(RegistrationError::AliasCollision {
                    alias: word.clone(),
                    existing: existing.clone(),
                });
            }
        }

        self.index.insert(name.clone(), name.clone());
        for alias in descriptor.aliases() {
            self.index.insert(alias.clone(), name.clone());
        }
        debug!(command = %name, aliases = ?descriptor.aliases(), "Registered command");
        self.commands.insert(
            name,
            RegisteredCommand {
                descriptor: Arc::new(descriptor),
                action,
            },
        );
        Ok(())
    }

    /// Removes a command and frees its name and aliases.
    pub fn unregister(&mut self, name: &str) -> Option<RegisteredCommand> {
        let removed = self.commands.remove(&normalize(name))?;
        self.index
            .retain(|_, target| target.as_str() != removed.descriptor.name());
        debug!(command = %removed.descriptor.name(), "Unregistered command");
        Some(removed)
    }

    /// Looks a command up by name or alias.
    pub fn find(&self, word: &str) -> Option<&RegisteredCommand> {
        let name = self.index.get(&normalize(word))?;
        self.commands.get(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered descriptors, sorted by name.
    pub fn descriptors(&self) -> Vec<&Arc<CommandDescriptor>> {
        let mut all: Vec<_> = self.commands.values().map(|c| &c.descriptor).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }
}
