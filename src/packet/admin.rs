//! Packets sent by an admin client to the server.

use super::wire::wire_struct;

/// Update categories an admin can subscribe to or poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum UpdateType {
    /// In-game date changes.
    Date = 0,
    /// Client join, info, update and quit events.
    ClientInfo = 1,
    /// Company creation, info, update and removal.
    CompanyInfo = 2,
    /// Company economy figures.
    CompanyEconomy = 3,
    /// Company vehicle and station statistics.
    CompanyStats = 4,
    /// Chat messages.
    Chat = 5,
    /// Server console output.
    Console = 6,
    /// Names of the game's commands.
    CmdNames = 7,
    /// Executed commands.
    CmdLogging = 8,
    /// Game script output.
    Gamescript = 9,
}

/// Bit flags describing how often an update category is delivered.
pub mod frequency {
    /// Only on explicit poll.
    pub const POLL: u16 = 0x01;
    /// Every game day.
    pub const DAILY: u16 = 0x02;
    /// Every game week.
    pub const WEEKLY: u16 = 0x04;
    /// Every game month.
    pub const MONTHLY: u16 = 0x08;
    /// Every game quarter.
    pub const QUARTERLY: u16 = 0x10;
    /// Every game year.
    pub const ANNUALLY: u16 = 0x20;
    /// As soon as the event happens.
    pub const AUTOMATIC: u16 = 0x40;
}

/// Chat destination types.
pub mod destination {
    /// Everyone on the server.
    pub const BROADCAST: u8 = 0;
    /// Members of one company.
    pub const TEAM: u8 = 1;
    /// A single client.
    pub const CLIENT: u8 = 2;
}

/// Network actions carried by chat packets.
pub mod action {
    /// Plain chat to everyone.
    pub const CHAT: u8 = 3;
    /// Chat to a company.
    pub const CHAT_COMPANY: u8 = 4;
    /// Chat to one client.
    pub const CHAT_CLIENT: u8 = 5;
    /// Chat relayed from an external source.
    pub const EXTERNAL_CHAT: u8 = 12;
}

wire_struct! {
    /// Join request authenticating the admin connection.
    AdminJoin {
        /// Admin port password configured on the server.
        password: String,
        /// Name identifying the admin client.
        name: String,
        /// Version of the admin client.
        version: String,
    }
}

wire_struct! {
    /// Notify the server that the admin is leaving.
    AdminQuit {}
}

wire_struct! {
    /// Subscribe to an update category at the given frequency.
    AdminUpdateFrequency {
        /// Category, see [`UpdateType`].
        update_type: u16,
        /// Frequency flags, see [`frequency`].
        frequency: u16,
    }
}

impl AdminUpdateFrequency {
    /// Build a subscription request for `update_type`.
    #[must_use]
    pub fn new(update_type: UpdateType, frequency: u16) -> Self {
        Self {
            update_type: update_type as u16,
            frequency,
        }
    }
}

wire_struct! {
    /// Poll an update category once.
    AdminPoll {
        /// Category, see [`UpdateType`].
        update_type: u8,
        /// Category-specific argument, for example a client id.
        extra: u32,
    }
}

wire_struct! {
    /// Send a chat message through the server.
    AdminChat {
        /// Network action, see [`action`].
        action: u8,
        /// Destination type, see [`destination`].
        destination_type: u8,
        /// Client or company id, ignored for broadcasts.
        destination: u32,
        /// Message text.
        message: String,
    }
}

impl AdminChat {
    /// Build a broadcast chat message.
    #[must_use]
    pub fn broadcast(message: impl Into<String>) -> Self {
        Self {
            action: action::CHAT,
            destination_type: destination::BROADCAST,
            destination: 0,
            message: message.into(),
        }
    }
}

wire_struct! {
    /// Execute a console command on the server.
    AdminRcon {
        /// Command line to execute.
        command: String,
    }
}

wire_struct! {
    /// Forward JSON to the running game script.
    AdminGamescript {
        /// JSON document.
        json: String,
    }
}

wire_struct! {
    /// Liveness probe answered by [`ServerPong`](super::ServerPong).
    AdminPing {
        /// Opaque value echoed back by the server.
        payload: u32,
    }
}
