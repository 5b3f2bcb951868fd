use k8s_openapi::api::core::v1::Pod;

/// The part of a pod specification the whitelist is applied to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub containers: Vec<ContainerImage>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerImage {
    pub name: String,
    /// Image reference, empty when the container doesn't declare one.
    pub image: String,
}

impl From<Pod> for WorkloadSpec {
    fn from(pod: Pod) -> Self {
        let containers = pod
            .spec
            .map(|spec| {
                spec.containers
                    .into_iter()
                    .map(|container| ContainerImage {
                        name: container.name,
                        image: container.image.unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        WorkloadSpec { containers }
    }
}
