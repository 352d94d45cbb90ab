use crate::{
    access::Impersonator,
    index::{self, CacheConfig, Index, ResourceCache, SyncTracker},
    k8s::{Client, InternalWorkspace, Resource, SpaceBinding, UserSignup},
    Backend,
};
use anyhow::{bail, Result};
use clap::Parser;
use futures::prelude::*;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    runtime::watcher,
};
use prometheus_client::registry::Registry;
use tokio::time::Duration;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Parser)]
#[clap(name = "workspaces-server", about = "Serves per-user views of workspaces")]
pub struct Args {
    #[clap(
        long,
        default_value = "workspaces=info,warn",
        env = "WORKSPACES_SERVER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// The namespace holding UserSignup and SpaceBinding resources.
    #[clap(long, default_value = "toolchain-host-operator")]
    identity_namespace: String,

    /// The namespace holding InternalWorkspace resources.
    #[clap(long, default_value = "workspaces-system")]
    workspaces_namespace: String,

    /// How long to wait for every watch to complete its initial listing
    /// before giving up.
    #[clap(long, default_value = "60")]
    cache_sync_timeout_secs: u64,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    /// Runs until shutdown without serving requests.
    pub async fn run(self) -> Result<()> {
        self.run_with(|_backend, shutdown| async move {
            drop(shutdown.signaled().await);
            Ok(())
        })
        .await
    }

    /// Builds the cache and, once it has synced, hands a [`Backend`] to
    /// `serve` along with a shutdown signal.
    pub async fn run_with<F, S>(self, serve: F) -> Result<()>
    where
        F: FnOnce(Backend, drain::Watch) -> S,
        S: Future<Output = Result<()>> + Send + 'static,
    {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            identity_namespace,
            workspaces_namespace,
            cache_sync_timeout_secs,
        } = self;

        let config = CacheConfig {
            identity_namespace,
            workspaces_namespace,
        };
        let resource_index = Index::shared(&config);

        let mut prom = <Registry>::default();
        index::metrics::register(
            prom.sub_registry_with_prefix("index"),
            resource_index.clone(),
        );
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        // Writes must reach the same cluster the watches read from.
        let kube_config = impersonation_config(&client).await?;

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        for (exists, kind) in [
            (
                api_resource_exists::<InternalWorkspace>(&runtime.client()).await,
                "internalworkspaces.workspaces.konflux-ci.dev",
            ),
            (
                api_resource_exists::<UserSignup>(&runtime.client()).await,
                "usersignups.toolchain.dev.openshift.com",
            ),
            (
                api_resource_exists::<SpaceBinding>(&runtime.client()).await,
                "spacebindings.toolchain.dev.openshift.com",
            ),
        ] {
            if !exists {
                bail!("{kind} resource kind not found");
            }
        }

        // Spawn resource watches.

        let mut sync = SyncTracker::new();

        let workspaces = runtime.watch_namespaced::<InternalWorkspace>(
            config.workspaces_namespace.clone(),
            watcher::Config::default(),
        );
        tokio::spawn(
            kubert::index::namespaced(
                resource_index.clone(),
                sync.track("internalworkspaces", workspaces),
            )
            .instrument(info_span!("internalworkspaces")),
        );

        let signups =
            runtime.watch_namespaced::<UserSignup>(config.identity_namespace.clone(), watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(resource_index.clone(), sync.track("usersignups", signups))
                .instrument(info_span!("usersignups")),
        );

        let bindings =
            runtime.watch_namespaced::<SpaceBinding>(config.identity_namespace.clone(), watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(resource_index.clone(), sync.track("spacebindings", bindings))
                .instrument(info_span!("spacebindings")),
        );

        sync.wait(Duration::from_secs(cache_sync_timeout_secs)).await?;
        info!("Resource cache synced");

        let writer = Impersonator::new(kube_config, config.workspaces_namespace.clone());
        let backend = Backend::new(ResourceCache::new(resource_index), &config, writer);
        tokio::spawn(serve(backend, runtime.shutdown_handle()).map(|res| {
            if let Err(error) = res {
                tracing::error!(%error, "Serving failed");
            }
        }));

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

/// Loads the server's own credentials for impersonated writes.
///
/// The kubeconfig is selected by the same flags as the watch client. The
/// in-cluster config is used only when no flags customize the selection.
/// `--as` and `--as-group` are ignored, since each write impersonates the
/// requesting user.
async fn impersonation_config(args: &kubert::ClientArgs) -> Result<kube::Config> {
    let kubeconfig = match &args.kubeconfig {
        Some(path) => Kubeconfig::read_from(path),
        None => Kubeconfig::read(),
    };
    let customized = args.kubeconfig.is_some()
        || args.context.is_some()
        || args.cluster.is_some()
        || args.user.is_some();

    match kubeconfig {
        Ok(kubeconfig) => select_config(kubeconfig, args).await,
        Err(error) if customized => Err(error.into()),
        Err(_) => Ok(kube::Config::incluster()?),
    }
}

async fn select_config(kubeconfig: Kubeconfig, args: &kubert::ClientArgs) -> Result<kube::Config> {
    let options = KubeConfigOptions {
        context: args.context.clone(),
        cluster: args.cluster.clone(),
        user: args.user.clone(),
    };
    Ok(kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?)
}

async fn api_resource_exists<T>(client: &Client) -> bool
where
    T: Resource,
    T::DynamicType: Default,
{
    let dt = Default::default();
    client
        .list_api_group_resources(&T::api_version(&dt))
        .await
        .ok()
        .iter()
        .flat_map(|r| r.resources.iter())
        .any(|r| r.kind == T::kind(&dt))
}
