use crate::{Field, ListQuery, SharedIndex};
use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeMetric},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};
use workspaces_server_k8s_api::InternalWorkspaceVisibility;

#[derive(Debug)]
struct Instrumented(SharedIndex);

pub fn register(reg: &mut Registry, index: SharedIndex) {
    reg.register_collector(Box::new(Instrumented(index)));
}

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let this = self.0.read();

        let sizes = [
            (
                "internal_workspace_index_size",
                "The number of internal workspaces in index",
                this.workspaces().namespace(),
                this.workspaces().len(),
            ),
            (
                "user_signup_index_size",
                "The number of user signups in index",
                this.signups().namespace(),
                this.signups().len(),
            ),
            (
                "space_binding_index_size",
                "The number of space bindings in index",
                this.bindings().namespace(),
                this.bindings().len(),
            ),
        ];
        for (name, help, ns, len) in sizes {
            let mut family = encoder.encode_descriptor(name, help, None, MetricType::Gauge)?;
            let labels = [("namespace", ns)];
            ConstGauge::new(len as u32).encode(family.encode_family(&labels)?)?;
        }

        let community = this
            .workspaces()
            .list(&ListQuery::Field(
                Field::Visibility,
                InternalWorkspaceVisibility::Community.to_string(),
            ))
            .map_or(0, |ws| ws.len());
        let mut community_encoder = encoder.encode_descriptor(
            "community_workspace_index_size",
            "The number of community workspaces in index",
            None,
            MetricType::Gauge,
        )?;
        let labels = [("namespace", this.workspaces().namespace())];
        ConstGauge::new(community as u32).encode(community_encoder.encode_family(&labels)?)?;

        Ok(())
    }
}
