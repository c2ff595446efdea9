use std::collections::BTreeSet;

/// Built-in kinds that are not namespaced and therefore never receive the
/// default namespace.
pub const BUILTIN_CLUSTER_SCOPED_KINDS: &[&str] = &[
    "APIService",
    "CSIDriver",
    "CSINode",
    "CertificateSigningRequest",
    "ClusterIssuer",
    "ClusterRole",
    "ClusterRoleBinding",
    "ComponentStatus",
    "CustomResourceDefinition",
    "FlowSchema",
    "IngressClass",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PodSecurityPolicy",
    "PriorityClass",
    "PriorityLevelConfiguration",
    "RuntimeClass",
    "StorageClass",
    "ValidatingAdmissionPolicy",
    "ValidatingAdmissionPolicyBinding",
    "ValidatingWebhookConfiguration",
    "VolumeAttachment",
];

/// Set of kinds treated as cluster-scoped while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterScope {
    kinds: BTreeSet<String>,
}

impl ClusterScope {
    /// Only the built-in kinds.
    pub fn builtin() -> Self {
        Self {
            kinds: BUILTIN_CLUSTER_SCOPED_KINDS
                .iter()
                .map(|k| (*k).to_owned())
                .collect(),
        }
    }

    /// Built-in kinds plus caller-supplied ones (e.g. cluster-scoped CRDs).
    #[must_use]
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn is_cluster_scoped(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }
}

impl Default for ClusterScope {
    fn default() -> Self {
        Self::builtin()
    }
}
