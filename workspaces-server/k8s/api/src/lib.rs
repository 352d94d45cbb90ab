#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod toolchain;
pub mod workspace;

pub use self::{
    labels::Selector,
    toolchain::{
        IdentityClaims, SpaceBinding, SpaceBindingSpec, UserSignup, UserSignupSpec,
        UserSignupStatus, PUBLIC_VIEWER,
    },
    workspace::{
        Condition, InternalWorkspace, InternalWorkspaceSpec, InternalWorkspaceStatus,
        InternalWorkspaceVisibility, Owner, OwnerIdentity, OwnerStatus, SpaceInfo, Workspace,
        WorkspaceSpec, WorkspaceStatus, WorkspaceVisibility,
    },
};
pub use k8s_openapi::{api, apimachinery};
pub use kube::{
    api::{Api, ObjectMeta, PostParams, ResourceExt},
    error::ErrorResponse,
    Client, Error, Resource,
};
