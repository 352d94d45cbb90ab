use crate::SpaceKey;
use workspaces_server_k8s_api::labels;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("workspace {0} not found")]
    WorkspaceNotFound(SpaceKey),

    /// The workspace exists but the user holds no grant on it.
    ///
    /// Never surfaced by the read façade, which reports these as
    /// [`Error::WorkspaceNotFound`].
    #[error("user {user} is not authorized to access workspace {workspace}")]
    Unauthorized { user: String, workspace: SpaceKey },

    #[error("more than one workspace found for {0}")]
    MoreThanOneFound(SpaceKey),

    #[error("workspace {0} already exists")]
    AlreadyExists(SpaceKey),

    /// A create request named a namespace other than the caller's own.
    #[error("user {user} may not create workspaces in namespace {namespace:?}")]
    NamespaceMismatch { user: String, namespace: String },

    #[error("workspace {0} has no display-name label")]
    MissingDisplayNameLabel(String),

    #[error("workspace {0} has no owner")]
    MissingOwnerLabel(String),

    #[error("invalid label selector: {0}")]
    InvalidLabelSelector(#[from] labels::ParseError),

    #[error("label selector may not reference internal label {0:?}")]
    InternalLabelSelector(String),

    #[error(
        "workspace {workspace} has been modified: requested generation {requested:?}, current generation {current:?}"
    )]
    Conflict {
        workspace: SpaceKey,
        requested: Option<i64>,
        current: Option<i64>,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("no identity record found for user {0}")]
    IdentityNotFound(String),

    #[error(transparent)]
    Platform(kube::Error),

    /// The server is misconfigured or its cached state is inconsistent.
    #[error("internal error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

// === impl Error ===

impl Error {
    /// Classifies an error returned by the platform for a request that
    /// targeted `workspace`.
    pub fn from_platform(workspace: SpaceKey, error: kube::Error) -> Self {
        match error {
            kube::Error::Api(rsp) if rsp.code == 403 => Self::Forbidden(rsp.message),
            kube::Error::Api(rsp) if rsp.code == 404 => Self::WorkspaceNotFound(workspace),
            kube::Error::Api(rsp) if rsp.code == 409 => Self::Conflict {
                workspace,
                requested: None,
                current: None,
            },
            error => Self::Platform(error),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::WorkspaceNotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    pub fn internal(error: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self::Internal(error.into())
    }

    /// Validation failures are caused by the request rather than by server
    /// state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingDisplayNameLabel(_)
                | Self::MissingOwnerLabel(_)
                | Self::InvalidLabelSelector(_)
                | Self::InternalLabelSelector(_)
                | Self::NamespaceMismatch { .. }
        )
    }
}
