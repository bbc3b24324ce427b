//! Command descriptors, argument declarations, tokenizing and the command
//! registry.

mod action;
mod descriptor;
mod registry;
mod signature;
mod split;

pub use action::{ActionResponse, BoxedAction, CommandAction, into_action};
pub use descriptor::{CommandDescriptor, DescriptorBuilder, Guards};
pub use registry::{CommandRegistry, RegisteredCommand, normalize};
pub use signature::{ArgKind, ArgSpec, parse_signature};
pub use split::{next_token, shell_split, split_invocation, tokenize};
