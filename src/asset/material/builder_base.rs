use std::{collections::BTreeMap, iter, ptr};

use float_ord::FloatOrd;
use itertools::{Either, Itertools};
use tracing::debug;

use super::{
    definitions::{nodes as node_types, NODE_MARGIN},
    nodes::{
        BuiltNode, BuiltNodeSocketLink, BuiltNodeSocketRef, NodeGroup, NodeGroupRef, NodeSocketId,
        NodeType, Ref, Value,
    },
};

#[derive(Debug)]
pub(crate) struct Input {
    id: &'static str,
    pipeline: Vec<&'static NodeGroup>,
    links: BTreeMap<NodeGroupRef, InputLink>,
    properties: BTreeMap<NodeGroupRef, Value>,
}

impl Input {
    fn is_dependency_free(&self) -> bool {
        self.links.values().all(InputLink::is_dependency_free)
    }

    fn depends_on(&self, other: &Self) -> bool {
        for link in self.links.values() {
            if link.depends_on(other.id) {
                return true;
            }
        }
        false
    }

    fn dependents<'a>(
        &'a self,
        inputs: &'a BTreeMap<&'static str, Input>,
    ) -> impl Iterator<Item = &'a Input> + 'a {
        inputs
            .values()
            .filter(|other_input| other_input.depends_on(self))
    }

    pub fn pipeline(&mut self, pipeline: Vec<&'static NodeGroup>) -> &mut Self {
        self.pipeline = pipeline;
        self
    }

    pub fn push(&mut self, node_group: &'static NodeGroup) -> &mut Self {
        self.pipeline.push(node_group);
        self
    }

    pub fn link(
        &mut self,
        target: &'static NodeGroup,
        socket: &'static str,
        source: impl Into<InputLink>,
    ) -> &mut Self {
        self.links
            .insert(NodeGroupRef::new(target, socket), source.into());
        self
    }

    pub fn property(
        &mut self,
        target: &'static NodeGroup,
        property: &'static str,
        value: Value,
    ) -> &mut Self {
        self.properties
            .insert(NodeGroupRef::new(target, property), value);
        self
    }

    pub fn socket(&self, socket: &'static str) -> Ref {
        Ref::new(self.id, socket)
    }

    fn build(&self, inputs: &mut BTreeMap<&'static str, BuiltInput>, nodes: &mut Vec<BuiltNode>) {
        debug!("building input {}", self.id);

        let mut outputs = BTreeMap::new();
        let mut x_min = 0.0f32;
        let mut y_min = 0.0f32;

        // find a free position for this input
        for target in self.links.values() {
            if let Some(input) = target.evaluate_input_only(inputs) {
                // the input should be placed onto the next column of it's rightmost dependency
                x_min = x_min.max(input.next_column());
                debug!(
                    "input {} placed onto the next column of dependency {}, new x: {}",
                    self.id, input.id, x_min
                );
            }
        }

        // make sure the position doesn't overlap any previous input
        for input in inputs.values() {
            if !input.x_overlaps(x_min) {
                continue;
            }

            // place the input below any previous inputs in this column
            y_min = y_min.max(input.next_row());
            debug!(
                "input {} placed below overlapping input {}, new y: {}",
                self.id, input.id, y_min
            );
        }

        let [x_max, y_max] = build_pipeline(
            &self.pipeline,
            [x_min, y_min],
            &self.links,
            &self.properties,
            inputs,
            &mut outputs,
            nodes,
        );

        inputs.insert(
            self.id,
            BuiltInput {
                id: self.id,
                outputs,
                x_max,
                y_max,
            },
        );
    }
}

pub(crate) struct BuiltInput {
    id: &'static str,
    pub outputs: BTreeMap<&'static str, BuiltNodeSocketRef>,
    x_max: f32,
    y_max: f32,
}

impl BuiltInput {
    pub fn next_column(&self) -> f32 {
        self.x_max + NODE_MARGIN
    }

    pub fn next_row(&self) -> f32 {
        self.y_max + NODE_MARGIN
    }

    pub fn x_overlaps(&self, min: f32) -> bool {
        min < self.x_max
    }
}

#[derive(Debug, Clone)]
pub(crate) enum InputLink {
    Input(Ref),
    Value(Value),
}

impl InputLink {
    fn is_dependency_free(&self) -> bool {
        match self {
            InputLink::Input(_) => false,
            InputLink::Value(_) => true,
        }
    }

    fn depends_on(&self, target: &'static str) -> bool {
        match self {
            InputLink::Input(r) => r.depends_on(target),
            InputLink::Value(_) => false,
        }
    }

    fn evaluate(&self, inputs: &BTreeMap<&'static str, BuiltInput>) -> BuiltNodeSocketLink {
        match self {
            InputLink::Input(r) => BuiltNodeSocketLink::Link(r.evaluate_input(inputs)),
            InputLink::Value(v) => BuiltNodeSocketLink::Value(v.clone()),
        }
    }

    fn evaluate_input_only<'a>(
        &self,
        inputs: &'a BTreeMap<&'static str, BuiltInput>,
    ) -> Option<&'a BuiltInput> {
        match self {
            InputLink::Input(r) => Some(r.evaluate_input_only(inputs)),
            InputLink::Value(_) => None,
        }
    }
}

impl From<Ref> for InputLink {
    fn from(r: Ref) -> Self {
        Self::Input(r)
    }
}

impl From<Value> for InputLink {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

pub(crate) struct Output {
    socket: NodeSocketId,
    input: Option<Ref>,
    pipeline: Vec<&'static NodeGroup>,
    links: BTreeMap<NodeGroupRef, InputLink>,
    properties: BTreeMap<NodeGroupRef, Value>,
}

impl Output {
    fn new(socket: NodeSocketId, input: Option<Ref>) -> Self {
        Self {
            socket,
            input,
            pipeline: Vec::new(),
            links: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, node_group: &'static NodeGroup) -> &mut Self {
        self.pipeline.push(node_group);
        self
    }

    pub fn link_input(&mut self, target: &'static NodeGroup, socket: &'static str) -> &mut Self {
        let Some(input) = self.input else {
            panic!("output {:?} has no input to link", self.socket);
        };

        self.links
            .insert(NodeGroupRef::new(target, socket), input.into());
        self
    }

    pub fn link(
        &mut self,
        target: &'static NodeGroup,
        socket: &'static str,
        source: impl Into<InputLink>,
    ) -> &mut Self {
        self.links
            .insert(NodeGroupRef::new(target, socket), source.into());
        self
    }

    fn dependencies(&self) -> impl Iterator<Item = &'static str> + '_ {
        if self.pipeline.is_empty() {
            Either::Left(self.input.iter().map(|r| r.target))
        } else {
            Either::Right(self.links.values().filter_map(|l| {
                if let InputLink::Input(r) = l {
                    Some(r.target)
                } else {
                    None
                }
            }))
        }
    }

    fn build(
        &self,
        inputs: &BTreeMap<&'static str, BuiltInput>,
        nodes: &mut Vec<BuiltNode>,
        position: [f32; 2],
        x_max: &mut f32,
        y_max: &mut f32,
    ) -> (NodeSocketId, BuiltNodeSocketRef) {
        let Some(last_group) = self.pipeline.last() else {
            let Some(input) = self.input else {
                panic!("output {:?} has neither an input nor a pipeline", self.socket);
            };

            return (self.socket, input.evaluate_input(inputs));
        };

        let mut outputs = BTreeMap::new();

        let [x_max_local, y_max_local] = build_pipeline(
            &self.pipeline,
            position,
            &self.links,
            &self.properties,
            inputs,
            &mut outputs,
            nodes,
        );

        *x_max = x_max.max(x_max_local);
        *y_max = y_max.max(y_max_local);

        assert!(
            last_group.outputs.len() == 1,
            "output pipeline last nodegroup must have exactly one output"
        );
        let output_name = last_group.outputs[0].0;

        let output = outputs
            .get(output_name)
            .expect("output pipeline result should exist");
        (self.socket, *output)
    }
}

/// Replaces any earlier output driving the same socket.
fn push_output(outputs: &mut Vec<Output>, output: Output) -> &mut Output {
    outputs.retain(|o| o.socket != output.socket);
    outputs.push(output);

    outputs.last_mut().expect("cannot be empty, just pushed")
}

/// Outputs ordered like the sockets of the node they feed.
fn sorted_outputs<'a>(outputs: &'a [Output], kind: &'static NodeType) -> Vec<&'a Output> {
    kind.input_sockets
        .iter()
        .filter_map(|socket| outputs.iter().find(|o| &o.socket == socket))
        .collect()
}

fn build_outputs(
    outputs: &[&Output],
    inputs: &BTreeMap<&'static str, BuiltInput>,
    nodes: &mut Vec<BuiltNode>,
    output_x: f32,
    output_y: &mut f32,
    x_max: &mut f32,
) -> BTreeMap<NodeSocketId, BuiltNodeSocketRef> {
    outputs
        .iter()
        .map(|output| {
            let ret = output.build(inputs, nodes, [output_x, *output_y], x_max, output_y);

            *output_y += NODE_MARGIN;

            ret
        })
        .collect()
}

/// Shading added on top of the main shader through an emission node.
pub(crate) struct Layer {
    socket_values: BTreeMap<NodeSocketId, Value>,
    outputs: Vec<Output>,
}

impl Layer {
    pub fn socket_value(&mut self, socket: impl Into<NodeSocketId>, value: Value) -> &mut Self {
        self.socket_values.insert(socket.into(), value);
        self
    }

    pub fn output(
        &mut self,
        socket: impl Into<NodeSocketId>,
        input: &'static str,
        source: &'static str,
    ) -> &mut Output {
        push_output(
            &mut self.outputs,
            Output::new(socket.into(), Some(Ref::new(input, source))),
        )
    }
}

fn build_pipeline(
    pipeline: &[&'static NodeGroup],
    position: [f32; 2],
    links: &BTreeMap<NodeGroupRef, InputLink>,
    properties: &BTreeMap<NodeGroupRef, Value>,
    inputs: &BTreeMap<&'static str, BuiltInput>,
    outputs: &mut BTreeMap<&'static str, BuiltNodeSocketRef>,
    nodes: &mut Vec<BuiltNode>,
) -> [f32; 2] {
    let [mut x, y] = position;
    let mut y_max = y;

    for node_group in pipeline {
        let group_links = links
            .iter()
            .filter(|(r, _)| r.depends_on(node_group))
            .map(|(r, l)| {
                let evaluated = l.evaluate(inputs);

                (r.name, evaluated)
            })
            .collect();

        let group_properties = properties
            .iter()
            .filter(|(r, _)| r.depends_on(node_group))
            .map(|(r, v)| (r.name, v.clone()))
            .collect();

        let [x_max_group, y_max_group] =
            node_group.build(nodes, outputs, &group_links, &group_properties, [x, y]);

        x = x_max_group + NODE_MARGIN;
        y_max = y_max.max(y_max_group);
    }

    let x_max = x - NODE_MARGIN;

    [x_max, y_max]
}

/// Topological sort based on Kahn's algorithm. Returns None on cyclic references.
fn topological_sort_inputs<'a>(
    inputs: &'a BTreeMap<&'static str, Input>,
) -> Option<Vec<&'a Input>> {
    let mut remaining_edges = inputs
        .values()
        .flat_map(|node| node.dependents(inputs).map(|dependent| (&*node, dependent)))
        .collect_vec();

    let mut start_nodes = inputs
        .values()
        .filter(|i| i.is_dependency_free())
        .collect_vec();

    let mut sorted = Vec::with_capacity(inputs.len());

    let mut removed_edge_targets = Vec::with_capacity(remaining_edges.len());
    while let Some(node) = start_nodes.pop() {
        // start nodes don't depend on anything, so they can be anywhere in the sorted list
        sorted.push(node);

        // remove all edges which are coming from this start node
        remaining_edges.retain(|&(source, target)| {
            if ptr::eq(source, node) {
                removed_edge_targets.push(target);
                false
            } else {
                true
            }
        });

        // check if any of the removed edges' targets are now "start nodes"
        for &target in &removed_edge_targets {
            // if no more edges connected from something to this target, this is a "start node"
            if remaining_edges
                .iter()
                .all(|&(_, remaining_target)| !ptr::eq(remaining_target, target))
            {
                start_nodes.push(target);
            }
        }

        removed_edge_targets.clear();
    }

    // if all edges couldn't be removed, there must be a cycle somewhere
    if remaining_edges.is_empty() {
        Some(sorted)
    } else {
        None
    }
}

pub(crate) struct MaterialBuilder {
    properties: BTreeMap<&'static str, Value>,
    shader: &'static NodeType,
    shader_socket_values: BTreeMap<NodeSocketId, Value>,
    inputs: BTreeMap<&'static str, Input>,
    outputs: Vec<Output>,
    layers: Vec<Layer>,
    additive: bool,
}

impl MaterialBuilder {
    pub fn new(shader: &'static NodeType) -> Self {
        Self {
            properties: BTreeMap::new(),
            shader,
            shader_socket_values: BTreeMap::new(),
            inputs: BTreeMap::new(),
            outputs: Vec::new(),
            layers: Vec::new(),
            additive: false,
        }
    }

    pub fn property(&mut self, name: &'static str, value: Value) -> &mut Self {
        self.properties.insert(name, value);
        self
    }

    pub fn socket_value(&mut self, socket: impl Into<NodeSocketId>, value: Value) -> &mut Self {
        self.shader_socket_values.insert(socket.into(), value);
        self
    }

    pub fn has_input(&self, id: &'static str) -> bool {
        self.inputs.contains_key(id)
    }

    pub fn input(&mut self, id: &'static str) -> &mut Input {
        self.inputs.entry(id).or_insert_with(|| Input {
            id,
            pipeline: Vec::new(),
            links: BTreeMap::new(),
            properties: BTreeMap::new(),
        })
    }

    pub fn output(
        &mut self,
        socket: impl Into<NodeSocketId>,
        input: &'static str,
        source: &'static str,
    ) -> &mut Output {
        push_output(
            &mut self.outputs,
            Output::new(socket.into(), Some(Ref::new(input, source))),
        )
    }

    /// Output computed entirely by its pipeline, without a single source input.
    pub fn output_pipeline(&mut self, socket: impl Into<NodeSocketId>) -> &mut Output {
        push_output(&mut self.outputs, Output::new(socket.into(), None))
    }

    /// Adds the surface onto a transparent shader, so it brightens what is behind it.
    pub fn additive(&mut self) -> &mut Self {
        self.additive = true;
        self
    }

    pub fn layer(&mut self) -> &mut Layer {
        self.layers.push(Layer {
            socket_values: BTreeMap::new(),
            outputs: Vec::new(),
        });

        self.layers.last_mut().expect("cannot be empty, just pushed")
    }

    pub fn build(self) -> BuiltMaterialData {
        let mut nodes = Vec::new();
        let mut built_inputs = BTreeMap::new();

        let sorted_inputs_initial =
            topological_sort_inputs(&self.inputs).expect("inputs must not have cyclic references");

        let mut sorted_inputs_reversed: Vec<&Input> =
            Vec::with_capacity(sorted_inputs_initial.len());

        // resort outputs based on socket orders, shader first and then layers
        let shader_outputs = sorted_outputs(&self.outputs, self.shader);
        let layer_outputs = self
            .layers
            .iter()
            .map(|layer| sorted_outputs(&layer.outputs, &node_types::EMISSION))
            .collect_vec();

        // collect the inputs the outputs depend on, also removes unused inputs
        for output in shader_outputs
            .iter()
            .chain(layer_outputs.iter().flatten())
            .rev()
        {
            for dependency in output.dependencies() {
                let evaluated_input = self
                    .inputs
                    .get(dependency)
                    .expect("output dependency should exist");

                sort_dependencies_recursive(
                    sorted_inputs_initial.iter().copied().rev(),
                    &mut sorted_inputs_reversed,
                    evaluated_input,
                );
            }
        }

        for input in sorted_inputs_reversed.into_iter().rev() {
            if built_inputs.contains_key(input.id) {
                continue;
            }

            input.build(&mut built_inputs, &mut nodes);
        }

        let mut x_max = built_inputs
            .values()
            .map(|i| i.x_max)
            .max_by_key(|&f| FloatOrd(f))
            .unwrap_or_default();

        let output_x = x_max + NODE_MARGIN;
        let mut output_y = 0.0;

        let shader_socket_links = build_outputs(
            &shader_outputs,
            &built_inputs,
            &mut nodes,
            output_x,
            &mut output_y,
            &mut x_max,
        );

        let layer_socket_links = layer_outputs
            .iter()
            .map(|outputs| {
                build_outputs(
                    outputs,
                    &built_inputs,
                    &mut nodes,
                    output_x,
                    &mut output_y,
                    &mut x_max,
                )
            })
            .collect_vec();

        let shader_x = x_max + NODE_MARGIN;

        let shader_index = nodes.len();
        nodes.push(self.shader.build(
            BTreeMap::new(),
            self.shader_socket_values,
            shader_socket_links,
            [shader_x, 0.0],
        ));

        let mut surface = BuiltNodeSocketRef::new(shader_index, NodeSocketId::Position(0));

        // emission layers are stacked below the shader and added onto it left to right
        let mut emission_y = self.shader.size[1] + NODE_MARGIN;
        let mut add_x = shader_x + self.shader.size[0].max(node_types::EMISSION.size[0]) + NODE_MARGIN;

        for (layer, socket_links) in self.layers.into_iter().zip(layer_socket_links) {
            debug!("adding emission layer at y {}", emission_y);

            let emission_index = nodes.len();
            nodes.push(node_types::EMISSION.build(
                BTreeMap::new(),
                layer.socket_values,
                socket_links,
                [shader_x, emission_y],
            ));
            emission_y += node_types::EMISSION.size[1] + NODE_MARGIN;

            let add_index = nodes.len();
            nodes.push(node_types::ADD_SHADER.build(
                BTreeMap::new(),
                BTreeMap::new(),
                [
                    (NodeSocketId::Position(0), surface),
                    (
                        NodeSocketId::Position(1),
                        BuiltNodeSocketRef::new(emission_index, NodeSocketId::Position(0)),
                    ),
                ]
                .into(),
                [add_x, 0.0],
            ));
            add_x += node_types::ADD_SHADER.size[0] + NODE_MARGIN;

            surface = BuiltNodeSocketRef::new(add_index, NodeSocketId::Position(0));
        }

        if self.additive {
            let transparent_index = nodes.len();
            nodes.push(node_types::TRANSPARENT_BSDF.build(
                BTreeMap::new(),
                BTreeMap::new(),
                BTreeMap::new(),
                [shader_x, emission_y],
            ));

            let add_index = nodes.len();
            nodes.push(node_types::ADD_SHADER.build(
                BTreeMap::new(),
                BTreeMap::new(),
                [
                    (NodeSocketId::Position(0), surface),
                    (
                        NodeSocketId::Position(1),
                        BuiltNodeSocketRef::new(transparent_index, NodeSocketId::Position(0)),
                    ),
                ]
                .into(),
                [add_x, 0.0],
            ));
            add_x += node_types::ADD_SHADER.size[0] + NODE_MARGIN;

            surface = BuiltNodeSocketRef::new(add_index, NodeSocketId::Position(0));
        }

        nodes.push(node_types::OUTPUT_MATERIAL.build(
            BTreeMap::new(),
            BTreeMap::new(),
            iter::once((NodeSocketId::Name("Surface"), surface)).collect(),
            [add_x, 0.0],
        ));

        // offset nodes so that the shader node is at (0, 0)
        // invert y-axis since it's from top to bottom to make node placement simpler
        for node in &mut nodes {
            node.offset_x(-shader_x);
            node.invert_y();
        }

        BuiltMaterialData {
            properties: self.properties,
            nodes,
        }
    }
}

fn sort_dependencies_recursive<'a>(
    mut inputs_to_check: impl Iterator<Item = &'a Input> + Clone,
    sorted_inputs_reversed: &mut Vec<&'a Input>,
    dependent: &'a Input,
) {
    sorted_inputs_reversed.push(dependent);

    if dependent.is_dependency_free() {
        return;
    }

    while let Some(input) = inputs_to_check.next() {
        if dependent.depends_on(input) {
            // inputs are already topologically sorted,
            // so no need to check all inputs for dependencies of dependencies,
            // just clone the iterator at it's current progress
            sort_dependencies_recursive(inputs_to_check.clone(), sorted_inputs_reversed, input);
        }
    }
}

/// Declarative node list of one material, ready to be applied to a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltMaterialData {
    properties: BTreeMap<&'static str, Value>,
    nodes: Vec<BuiltNode>,
}

impl BuiltMaterialData {
    /// Material flags such as `blend_method` and `use_backface_culling`.
    pub fn properties(&self) -> &BTreeMap<&'static str, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Nodes in creation order. Links only point to earlier nodes.
    pub fn nodes(&self) -> &[BuiltNode] {
        &self.nodes
    }

    pub fn find_node(&self, host_id: &str) -> Option<&BuiltNode> {
        self.nodes.iter().find(|n| n.host_id() == host_id)
    }

    pub fn count_nodes(&self, host_id: &str) -> usize {
        self.nodes.iter().filter(|n| n.host_id() == host_id).count()
    }

    /// Node linked into `socket` of `node`.
    pub fn link_source(
        &self,
        node: &BuiltNode,
        socket: impl Into<NodeSocketId>,
    ) -> Option<&BuiltNode> {
        node.socket_links()
            .get(&socket.into())
            .map(|r| r.evaluate_node(&self.nodes))
    }

    /// Whether `node` depends on a node of kind `host_id` through any chain of links.
    pub fn depends_on(&self, node: &BuiltNode, host_id: &str) -> bool {
        let mut pending = node.socket_links().values().copied().collect_vec();
        let mut visited = Vec::new();

        while let Some(link) = pending.pop() {
            if visited.contains(&link.node_index()) {
                continue;
            }
            visited.push(link.node_index());

            let source = link.evaluate_node(&self.nodes);
            if source.host_id() == host_id {
                return true;
            }
            pending.extend(source.socket_links().values().copied());
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::material::{
        definitions::{groups, shaders},
        nodes::{ImageSource, Placeholder},
    };

    fn white_texture_input(builder: &mut MaterialBuilder, id: &'static str) {
        builder
            .input(id)
            .pipeline(vec![&groups::TEXTURE])
            .property(
                &groups::TEXTURE,
                "image",
                Value::Image(ImageSource::Placeholder(Placeholder::White)),
            )
            .property(&groups::TEXTURE, "interpolation", Value::Enum("Linear"));
    }

    #[test]
    fn topological_sort_inputs_cyclic() {
        let inputs = [
            (
                "0",
                Input {
                    id: "0",
                    pipeline: Vec::new(),
                    links: [(
                        NodeGroupRef::new(&groups::TEXTURE, "?"),
                        InputLink::Input(Ref::new("3", "?")),
                    )]
                    .into(),
                    properties: BTreeMap::new(),
                },
            ),
            (
                "1",
                Input {
                    id: "1",
                    pipeline: Vec::new(),
                    links: [(
                        NodeGroupRef::new(&groups::TEXTURE, "?"),
                        InputLink::Value(Value::Bool(false)),
                    )]
                    .into(),
                    properties: BTreeMap::new(),
                },
            ),
            (
                "2",
                Input {
                    id: "2",
                    pipeline: Vec::new(),
                    links: [(
                        NodeGroupRef::new(&groups::TEXTURE, "?"),
                        InputLink::Input(Ref::new("0", "?")),
                    )]
                    .into(),
                    properties: BTreeMap::new(),
                },
            ),
            (
                "3",
                Input {
                    id: "3",
                    pipeline: Vec::new(),
                    links: [(
                        NodeGroupRef::new(&groups::TEXTURE, "?"),
                        InputLink::Input(Ref::new("2", "?")),
                    )]
                    .into(),
                    properties: BTreeMap::new(),
                },
            ),
        ]
        .into();

        let result = topological_sort_inputs(&inputs);

        assert!(result.is_none());
    }

    #[test]
    fn topological_sort_inputs_noncyclic() {
        let inputs: BTreeMap<_, _> = [
            (
                "0",
                Input {
                    id: "0",
                    pipeline: Vec::new(),
                    links: [(
                        NodeGroupRef::new(&groups::TEXTURE, "?"),
                        InputLink::Input(Ref::new("3", "?")),
                    )]
                    .into(),
                    properties: BTreeMap::new(),
                },
            ),
            (
                "1",
                Input {
                    id: "1",
                    pipeline: Vec::new(),
                    links: [(
                        NodeGroupRef::new(&groups::TEXTURE, "?"),
                        InputLink::Value(Value::Bool(false)),
                    )]
                    .into(),
                    properties: BTreeMap::new(),
                },
            ),
            (
                "2",
                Input {
                    id: "2",
                    pipeline: Vec::new(),
                    links: [(
                        NodeGroupRef::new(&groups::TEXTURE, "?"),
                        InputLink::Input(Ref::new("1", "?")),
                    )]
                    .into(),
                    properties: BTreeMap::new(),
                },
            ),
            (
                "3",
                Input {
                    id: "3",
                    pipeline: Vec::new(),
                    links: [(
                        NodeGroupRef::new(&groups::TEXTURE, "?"),
                        InputLink::Input(Ref::new("1", "?")),
                    )]
                    .into(),
                    properties: BTreeMap::new(),
                },
            ),
        ]
        .into();

        let i0 = inputs.get("0").unwrap();
        let i1 = inputs.get("1").unwrap();
        let i2 = inputs.get("2").unwrap();
        let i3 = inputs.get("3").unwrap();

        let result = topological_sort_inputs(&inputs).unwrap();

        assert!(
            result.iter().position(|&r| ptr::eq(r, i0)).unwrap()
                > result.iter().position(|&r| ptr::eq(r, i3)).unwrap()
        );

        assert!(
            result.iter().position(|&r| ptr::eq(r, i2)).unwrap()
                > result.iter().position(|&r| ptr::eq(r, i1)).unwrap()
        );

        assert!(
            result.iter().position(|&r| ptr::eq(r, i3)).unwrap()
                > result.iter().position(|&r| ptr::eq(r, i1)).unwrap()
        );
    }

    #[test]
    fn shader_placed_at_origin_and_linked_to_output() {
        let mut builder = MaterialBuilder::new(&shaders::PRINCIPLED);
        white_texture_input(&mut builder, "$basetexture");
        builder.output("Base Color", "$basetexture", "color");

        let built = builder.build();
        assert_eq!(built.nodes().len(), 3);

        let shader = built.find_node("ShaderNodeBsdfPrincipled").unwrap();
        assert_eq!(shader.position(), [0.0, 0.0]);

        let texture = built.link_source(shader, "Base Color").unwrap();
        assert_eq!(texture.host_id(), "ShaderNodeTexImage");
        assert!(texture.position()[0] < 0.0);

        let output = built.find_node("ShaderNodeOutputMaterial").unwrap();
        assert_eq!(built.link_source(output, "Surface"), Some(shader));
        assert!(output.position()[0] > 0.0);
    }

    #[test]
    fn unused_inputs_are_skipped() {
        let mut builder = MaterialBuilder::new(&shaders::PRINCIPLED);
        white_texture_input(&mut builder, "$basetexture");

        let built = builder.build();

        assert_eq!(built.nodes().len(), 2);
        assert_eq!(built.count_nodes("ShaderNodeTexImage"), 0);
    }

    #[test]
    fn later_output_replaces_earlier_one() {
        let mut builder = MaterialBuilder::new(&shaders::PRINCIPLED);
        white_texture_input(&mut builder, "$basetexture");
        builder
            .output("Alpha", "$basetexture", "alpha")
            .push(&groups::MULTIPLY_VALUE)
            .link_input(&groups::MULTIPLY_VALUE, "value")
            .link(&groups::MULTIPLY_VALUE, "fac", Value::Float(0.5));
        builder.output("Alpha", "$basetexture", "alpha");

        let built = builder.build();
        let shader = built.find_node("ShaderNodeBsdfPrincipled").unwrap();

        assert_eq!(
            built.link_source(shader, "Alpha").map(BuiltNode::host_id),
            Some("ShaderNodeTexImage")
        );
        assert_eq!(built.count_nodes("ShaderNodeMath"), 0);
    }

    #[test]
    fn layers_chain_through_add_shaders() {
        let mut builder = MaterialBuilder::new(&shaders::PRINCIPLED);
        builder
            .input("rim")
            .pipeline(vec![&groups::RIM_LIGHT])
            .link(&groups::RIM_LIGHT, "exponent", Value::Float(4.0))
            .link(&groups::RIM_LIGHT, "boost", Value::Float(1.0));

        builder
            .layer()
            .socket_value("Color", Value::Color([1.0, 1.0, 1.0, 1.0]))
            .output("Strength", "rim", "value");
        builder
            .layer()
            .socket_value("Color", Value::Color([0.0, 0.0, 1.0, 1.0]))
            .socket_value("Strength", Value::Float(1.0));

        let built = builder.build();
        assert_eq!(built.count_nodes("ShaderNodeEmission"), 2);
        assert_eq!(built.count_nodes("ShaderNodeAddShader"), 2);

        let output = built.find_node("ShaderNodeOutputMaterial").unwrap();
        let last_add = built.link_source(output, "Surface").unwrap();
        assert_eq!(last_add.host_id(), "ShaderNodeAddShader");

        let first_add = built.link_source(last_add, NodeSocketId::Position(0)).unwrap();
        assert_eq!(first_add.host_id(), "ShaderNodeAddShader");
        assert_eq!(
            built.link_source(first_add, NodeSocketId::Position(0)).map(BuiltNode::host_id),
            Some("ShaderNodeBsdfPrincipled")
        );

        let rim_emission = built.link_source(first_add, NodeSocketId::Position(1)).unwrap();
        assert!(built.depends_on(rim_emission, "ShaderNodeNewGeometry"));
        assert_eq!(
            built.link_source(rim_emission, "Strength").map(BuiltNode::host_id),
            Some("ShaderNodeMath")
        );

        let shader = built.find_node("ShaderNodeBsdfPrincipled").unwrap();
        assert!(rim_emission.position()[1] < shader.position()[1]);
    }

    #[test]
    fn pipeline_output_builds_without_source_input() {
        let mut builder = MaterialBuilder::new(&shaders::PRINCIPLED);
        builder
            .output_pipeline("Specular IOR Level")
            .push(&groups::PHONG_SPECULAR)
            .link(&groups::PHONG_SPECULAR, "min", Value::Float(0.0))
            .link(&groups::PHONG_SPECULAR, "mid", Value::Float(0.5))
            .link(&groups::PHONG_SPECULAR, "max", Value::Float(1.0))
            .link(&groups::PHONG_SPECULAR, "specular", Value::Float(0.25))
            .link(&groups::PHONG_SPECULAR, "mask", Value::Float(1.0));

        let built = builder.build();
        let shader = built.find_node("ShaderNodeBsdfPrincipled").unwrap();
        let specular = built.link_source(shader, "Specular IOR Level").unwrap();

        assert_eq!(specular.host_id(), "ShaderNodeMath");
        assert_eq!(built.count_nodes("ShaderNodeMapRange"), 3);
        assert!(built.depends_on(specular, "ShaderNodeNewGeometry"));
    }

    #[test]
    fn additive_surface_adds_onto_transparent() {
        let mut builder = MaterialBuilder::new(&shaders::PRINCIPLED);
        builder
            .layer()
            .socket_value("Color", Value::Color([1.0, 1.0, 1.0, 1.0]))
            .socket_value("Strength", Value::Float(1.0));
        builder.additive();

        let built = builder.build();
        assert_eq!(built.count_nodes("ShaderNodeAddShader"), 2);

        let output = built.find_node("ShaderNodeOutputMaterial").unwrap();
        let last_add = built.link_source(output, "Surface").unwrap();
        assert_eq!(
            built.link_source(last_add, NodeSocketId::Position(1)).map(BuiltNode::host_id),
            Some("ShaderNodeBsdfTransparent")
        );

        let layered = built.link_source(last_add, NodeSocketId::Position(0)).unwrap();
        assert_eq!(layered.host_id(), "ShaderNodeAddShader");
        assert!(built.depends_on(layered, "ShaderNodeEmission"));
    }
}
