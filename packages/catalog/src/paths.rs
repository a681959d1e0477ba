//! Endpoint paths, relative to the API base URL.

pub const MEMORIES: &str = "/memories/";
pub const MEMORIES_CREATE: &str = "/memories/create";
pub const TRACKS: &str = "/tracks/";
pub const SUPERVISORS: &str = "/supervisors/";
pub const KEYWORDS: &str = "/keywords/";

pub fn memoire(id: u64) -> String {
    format!("{}{}/", MEMORIES, id)
}

pub fn memoire_delete(id: u64) -> String {
    format!("/memories/delete/{}/", id)
}

pub fn track(id: u64) -> String {
    format!("{}{}/", TRACKS, id)
}

pub fn supervisor(id: u64) -> String {
    format!("{}{}/", SUPERVISORS, id)
}
