#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Convert the whole subtree below the starting node, not just the node.
    pub recursive: bool,
    /// Prefix for descriptor names when a geometry has no name.
    pub default_geometry_name: String,
    /// Shininess at or above this value maps to a roughness of zero.
    pub shininess_range: f32,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            default_geometry_name: "dae".to_string(),
            shininess_range: 1000.0,
        }
    }
}
