//! Bot commands.
//!
//! Every command needs the author in a voice channel, see [author_in_voice](crate::music::call::author_in_voice).

mod play;
mod queue;
mod skip;
mod stop;
mod volume;

use crate::{Data, JukeboxError};

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, JukeboxError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![
        play::play(),
        skip::skip(),
        stop::stop(),
        queue::queue(),
        volume::volume(),
    ]
}
