use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::debug;

use crate::asset::material::{BuiltMaterialData, NodeSocketId, Value};

/// Tag carried by every node this crate creates.
pub const OWNER: &str = "vertexlit";

/// Material properties an import may set. Each import resets all of them first.
pub const MATERIAL_PROPERTIES: &[&str] = &[
    "blend_method",
    "shadow_method",
    "alpha_threshold",
    "use_backface_culling",
];

/// Node graph of one material in the host application.
///
/// Nodes are tagged with an owner when created; only nodes carrying this crate's
/// tag are ever removed.
pub trait ShaderGraph {
    type NodeId: Copy;

    fn owned_nodes(&self, owner: &str) -> Vec<Self::NodeId>;

    fn remove_node(&mut self, node: Self::NodeId);

    fn add_node(&mut self, owner: &str, host_id: &str, position: [f32; 2]) -> Self::NodeId;

    fn set_property(&mut self, node: Self::NodeId, name: &str, value: &Value);

    fn set_socket_value(&mut self, node: Self::NodeId, socket: NodeSocketId, value: &Value);

    fn link(
        &mut self,
        from: Self::NodeId,
        from_socket: NodeSocketId,
        to: Self::NodeId,
        to_socket: NodeSocketId,
    );

    fn set_material_property(&mut self, name: &str, value: &Value);

    /// Restores the host default of a material property.
    fn clear_material_property(&mut self, name: &str);
}

impl BuiltMaterialData {
    /// Replaces the nodes previously created by this crate with these ones.
    pub fn apply<G: ShaderGraph + ?Sized>(&self, graph: &mut G) {
        let stale = graph.owned_nodes(OWNER);
        debug!("removing {} previously imported nodes", stale.len());

        for node in stale {
            graph.remove_node(node);
        }

        let ids = self
            .nodes()
            .iter()
            .map(|node| {
                let id = graph.add_node(OWNER, node.host_id(), node.position());

                for (name, value) in node.properties() {
                    graph.set_property(id, name, value);
                }

                for (&socket, value) in node.socket_values() {
                    graph.set_socket_value(id, socket, value);
                }

                id
            })
            .collect_vec();

        for (node, &id) in self.nodes().iter().zip(&ids) {
            for (&socket, link) in node.socket_links() {
                graph.link(ids[link.node_index()], link.socket(), id, socket);
            }
        }

        for name in MATERIAL_PROPERTIES {
            graph.clear_material_property(name);
        }

        for (name, value) in self.properties() {
            graph.set_material_property(name, value);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryNode {
    pub owner: Option<String>,
    pub host_id: String,
    pub position: [f32; 2],
    pub properties: BTreeMap<String, Value>,
    pub socket_values: BTreeMap<NodeSocketId, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLink {
    pub from: usize,
    pub from_socket: NodeSocketId,
    pub to: usize,
    pub to_socket: NodeSocketId,
}

/// Shape of a graph with node ids replaced by creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub nodes: Vec<(Option<String>, String)>,
    pub links: Vec<(usize, NodeSocketId, usize, NodeSocketId)>,
}

/// In-memory [`ShaderGraph`].
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    nodes: BTreeMap<usize, MemoryNode>,
    links: Vec<MemoryLink>,
    material_properties: BTreeMap<String, Value>,
    next_id: usize,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node not owned by this crate, as a user edit would.
    pub fn add_foreign_node(&mut self, host_id: &str) -> usize {
        self.insert(None, host_id, [0.0, 0.0])
    }

    fn insert(&mut self, owner: Option<&str>, host_id: &str, position: [f32; 2]) -> usize {
        let id = self.next_id;
        self.next_id += 1;

        self.nodes.insert(
            id,
            MemoryNode {
                owner: owner.map(str::to_owned),
                host_id: host_id.to_owned(),
                position,
                properties: BTreeMap::new(),
                socket_values: BTreeMap::new(),
            },
        );

        id
    }

    pub fn node(&self, id: usize) -> Option<&MemoryNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (usize, &MemoryNode)> {
        self.nodes.iter().map(|(&id, node)| (id, node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_node(&self, host_id: &str) -> Option<usize> {
        self.nodes()
            .find(|(_, node)| node.host_id == host_id)
            .map(|(id, _)| id)
    }

    pub fn links(&self) -> &[MemoryLink] {
        &self.links
    }

    /// Node linked into `socket` of `node`.
    pub fn link_source(&self, node: usize, socket: impl Into<NodeSocketId>) -> Option<usize> {
        let socket = socket.into();

        self.links
            .iter()
            .find(|l| l.to == node && l.to_socket == socket)
            .map(|l| l.from)
    }

    pub fn material_property(&self, name: &str) -> Option<&Value> {
        self.material_properties.get(name)
    }

    pub fn topology(&self) -> Topology {
        let order: BTreeMap<usize, usize> = self
            .nodes
            .keys()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();

        let nodes = self
            .nodes
            .values()
            .map(|node| (node.owner.clone(), node.host_id.clone()))
            .collect();

        let links = self
            .links
            .iter()
            .map(|l| (order[&l.from], l.from_socket, order[&l.to], l.to_socket))
            .sorted()
            .collect();

        Topology { nodes, links }
    }
}

impl ShaderGraph for MemoryGraph {
    type NodeId = usize;

    fn owned_nodes(&self, owner: &str) -> Vec<usize> {
        self.nodes()
            .filter(|(_, node)| node.owner.as_deref() == Some(owner))
            .map(|(id, _)| id)
            .collect()
    }

    fn remove_node(&mut self, node: usize) {
        self.nodes.remove(&node);
        self.links.retain(|l| l.from != node && l.to != node);
    }

    fn add_node(&mut self, owner: &str, host_id: &str, position: [f32; 2]) -> usize {
        self.insert(Some(owner), host_id, position)
    }

    fn set_property(&mut self, node: usize, name: &str, value: &Value) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.properties.insert(name.to_owned(), value.clone());
        }
    }

    fn set_socket_value(&mut self, node: usize, socket: NodeSocketId, value: &Value) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.socket_values.insert(socket, value.clone());
        }
    }

    fn link(&mut self, from: usize, from_socket: NodeSocketId, to: usize, to_socket: NodeSocketId) {
        // an input socket takes a single link
        self.links
            .retain(|l| !(l.to == to && l.to_socket == to_socket));

        self.links.push(MemoryLink {
            from,
            from_socket,
            to,
            to_socket,
        });
    }

    fn set_material_property(&mut self, name: &str, value: &Value) {
        self.material_properties
            .insert(name.to_owned(), value.clone());
    }

    fn clear_material_property(&mut self, name: &str) {
        self.material_properties.remove(name);
    }
}
