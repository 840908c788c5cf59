// Copyright © 2024 blitzbeaver contributors

pub mod beaver;

pub use self::beaver::{
    from_bytes, load_graph, read_graph, save_graph, to_bytes, write_graph,
    PersistedGraphFormatError, BEAVER_MAGIC, BEAVER_VERSION,
};
