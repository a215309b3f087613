//! Packets sent by the server to an admin client.

use super::wire::wire_struct;

wire_struct! {
    /// The server has no free admin slots.
    ServerFull {}
}

wire_struct! {
    /// The admin's address is banned.
    ServerBanned {}
}

wire_struct! {
    /// The server rejected the last request.
    ServerError {
        /// OpenTTD network error code.
        error: u8,
    }
}

wire_struct! {
    /// One entry of [`ServerProtocol::settings`].
    UpdateSetting {
        /// Update category.
        update_type: u16,
        /// Frequencies the server allows for the category.
        frequencies: u16,
    }
}

wire_struct! {
    /// First reply to a successful join: protocol version and allowed
    /// update frequencies.
    ServerProtocol {
        /// Admin protocol version spoken by the server.
        version: u8,
        /// Allowed frequencies per update category.
        settings: Vec<UpdateSetting>,
    }
}

wire_struct! {
    /// Second reply to a successful join; completes authentication.
    ServerWelcome {
        /// Name of the server.
        server_name: String,
        /// OpenTTD revision of the server.
        generation_version: String,
        /// Whether the server is dedicated.
        dedicated: bool,
        /// Name of the loaded map.
        map_name: String,
        /// Map generation seed.
        seed: u32,
        /// Landscape (climate) id.
        landscape: u8,
        /// Start date of the game, in days.
        start_date: u32,
        /// Map width in tiles.
        map_width: u16,
        /// Map height in tiles.
        map_height: u16,
    }
}

wire_struct! {
    /// A new game started.
    ServerNewGame {}
}

wire_struct! {
    /// The server is shutting down.
    ServerShutdown {}
}

wire_struct! {
    /// Current in-game date.
    ServerDate {
        /// Date in days since year 0.
        date: u32,
    }
}

wire_struct! {
    /// A client joined the game.
    ServerClientJoin {
        /// Id of the joining client.
        client_id: u32,
    }
}

wire_struct! {
    /// Details about a client.
    ServerClientInfo {
        /// Client id.
        client_id: u32,
        /// Network address of the client.
        address: String,
        /// Client name.
        name: String,
        /// Language id.
        language: u8,
        /// Date the client joined, in days.
        join_date: u32,
        /// Company the client plays for.
        company: u8,
    }
}

wire_struct! {
    /// A client changed name or company.
    ServerClientUpdate {
        /// Client id.
        client_id: u32,
        /// New client name.
        name: String,
        /// New company.
        company: u8,
    }
}

wire_struct! {
    /// A client left the game.
    ServerClientQuit {
        /// Client id.
        client_id: u32,
    }
}

wire_struct! {
    /// A client was dropped because of an error.
    ServerClientError {
        /// Client id.
        client_id: u32,
        /// OpenTTD network error code.
        error: u8,
    }
}

wire_struct! {
    /// A company was founded.
    ServerCompanyNew {
        /// Company id.
        company: u8,
    }
}

wire_struct! {
    /// Details about a company.
    ServerCompanyInfo {
        /// Company id.
        company: u8,
        /// Company name.
        name: String,
        /// Manager name.
        manager: String,
        /// Company colour.
        colour: u8,
        /// Whether the company is password protected.
        passworded: bool,
        /// Year of inauguration.
        start_year: u32,
        /// Whether the company is run by an AI.
        is_ai: bool,
    }
}

wire_struct! {
    /// A company changed its details.
    ServerCompanyUpdate {
        /// Company id.
        company: u8,
        /// Company name.
        name: String,
        /// Manager name.
        manager: String,
        /// Company colour.
        colour: u8,
        /// Whether the company is password protected.
        passworded: bool,
        /// Quarters the company has been bankrupt.
        bankruptcy_quarters: u8,
    }
}

wire_struct! {
    /// A company was removed.
    ServerCompanyRemove {
        /// Company id.
        company: u8,
        /// Removal reason code.
        reason: u8,
    }
}

wire_struct! {
    /// A chat message was sent in game.
    ServerChat {
        /// Network action.
        action: u8,
        /// Destination type.
        destination_type: u8,
        /// Id of the sending client.
        client_id: u32,
        /// Message text.
        message: String,
        /// Action-specific data, for example money given.
        data: u64,
    }
}

wire_struct! {
    /// One line of output of an [`AdminRcon`](super::AdminRcon) command.
    ServerRcon {
        /// Text colour.
        colour: u16,
        /// Output line.
        output: String,
    }
}

wire_struct! {
    /// One line of server console output.
    ServerConsole {
        /// Origin of the line, for example `net` or `script`.
        origin: String,
        /// Console text.
        message: String,
    }
}

wire_struct! {
    /// One entry of [`ServerCmdNames::commands`].
    CommandName {
        /// Command id.
        command: u16,
        /// Command name.
        name: String,
    }
}

wire_struct! {
    /// Names of the game's commands.
    ServerCmdNames {
        /// Command id and name pairs.
        commands: Vec<CommandName>,
    }
}

wire_struct! {
    /// JSON emitted by the game script.
    ServerGamescript {
        /// JSON document.
        json: String,
    }
}

wire_struct! {
    /// Marks the end of the output of an rcon command.
    ServerRconEnd {
        /// The command that finished.
        command: String,
    }
}

wire_struct! {
    /// Answer to an [`AdminPing`](super::AdminPing).
    ServerPong {
        /// Value from the ping.
        payload: u32,
    }
}
