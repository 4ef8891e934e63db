pub mod list {
    use crate::api::FolderNode;
    use bb_server_macros::HttpStatusCode;
    use serde::{Deserialize, Serialize};

    /// Both fields are required; they are optional here so that a missing one is reported as
    /// [`Response::Invalid`] rather than a bare query rejection.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Query {
        pub year: Option<String>,
        pub route: Option<String>,
    }

    #[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Response {
        #[http(status = 200)]
        Ok { folders: Vec<FolderNode> },
        #[http(status = 400)]
        Invalid { reason: String },
        #[http(status = 401)]
        Unauthorized,
        /// The media root does not exist.
        #[http(status = 404)]
        NotFound,
        #[http(status = 500)]
        Internal,
    }
}
