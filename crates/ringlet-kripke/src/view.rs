//! Rendering Kripke structures through pluggable handlers
//!
//! [`GenericKripkeStructureView`] walks a structure and lets a
//! [`KripkeStructureViewHandler`] write each part. Edges are buffered while
//! the states are written and appended after the initial markers, so
//! formats that need all nodes declared before any edge work unchanged.

use crate::constraint::ExpressionFormat;
use crate::edge::KripkeEdge;
use crate::errors::{KripkeError, Result};
use crate::property::{KripkeStateProperty, KripkeStatePropertyList};
use crate::state::KripkeState;
use crate::structure::KripkeStructure;
use std::io::Write;

/// Data shared between the driver and the handler during one render
pub struct ViewData<'a> {
    structure: &'a dyn KripkeStructure,
    initials: Vec<(usize, usize)>,
    using_clocks: bool,
}

impl<'a> ViewData<'a> {
    fn new(structure: &'a dyn KripkeStructure, using_clocks: bool) -> Self {
        Self {
            structure,
            initials: Vec::new(),
            using_clocks,
        }
    }

    /// The structure being rendered
    pub fn structure(&self) -> &dyn KripkeStructure {
        self.structure
    }

    /// Whether clock labels should be rendered
    pub fn using_clocks(&self) -> bool {
        self.using_clocks
    }

    /// Record an initial marker `pseudo_id` pointing at state `id`
    pub fn add_initial(&mut self, pseudo_id: usize, id: usize) {
        self.initials.push((pseudo_id, id));
    }

    /// Initial markers recorded so far
    pub fn initials(&self) -> &[(usize, usize)] {
        &self.initials
    }

    /// Id of the state an edge leads to
    pub fn fetch_id(&self, target: &KripkeStatePropertyList) -> Result<usize> {
        self.structure
            .id_for(target)
            .ok_or_else(|| KripkeError::unknown_target(target.to_string()))
    }
}

/// Writes one output format
pub trait KripkeStructureViewHandler {
    /// Preamble
    fn handle_start(&mut self, data: &mut ViewData<'_>, out: &mut dyn Write) -> Result<()>;

    /// One node
    fn handle_state(
        &mut self,
        data: &mut ViewData<'_>,
        state: &KripkeState,
        id: usize,
        is_initial: bool,
        out: &mut dyn Write,
    ) -> Result<()>;

    /// Outgoing edges of one node
    fn handle_effects(
        &mut self,
        data: &mut ViewData<'_>,
        state: &KripkeState,
        id: usize,
        out: &mut dyn Write,
    ) -> Result<()>;

    /// Initial markers recorded while writing the nodes
    fn handle_initials(
        &mut self,
        data: &mut ViewData<'_>,
        initials: &[(usize, usize)],
        out: &mut dyn Write,
    ) -> Result<()>;

    /// Trailer
    fn handle_end(&mut self, data: &mut ViewData<'_>, out: &mut dyn Write) -> Result<()>;
}

/// Drives a handler over a whole structure
#[derive(Debug, Clone, Default)]
pub struct GenericKripkeStructureView<H> {
    handler: H,
    using_clocks: bool,
}

impl<H: KripkeStructureViewHandler> GenericKripkeStructureView<H> {
    /// A view rendering with `handler`
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            using_clocks: false,
        }
    }

    /// Render clock labels on edges
    pub fn with_clocks(mut self, using_clocks: bool) -> Self {
        self.using_clocks = using_clocks;
        self
    }

    /// The wrapped handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Render `structure` into `out`
    pub fn generate<W: Write>(&mut self, structure: &dyn KripkeStructure, out: &mut W) -> Result<()> {
        let mut data = ViewData::new(structure, self.using_clocks);
        let mut edges: Vec<u8> = Vec::new();

        self.handler.handle_start(&mut data, out)?;
        for (id, state) in structure.states() {
            self.handler
                .handle_state(&mut data, state, id, state.is_initial(), out)?;
            self.handler.handle_effects(&mut data, state, id, &mut edges)?;
        }
        let initials = data.initials.clone();
        self.handler.handle_initials(&mut data, &initials, out)?;
        out.write_all(&edges)?;
        self.handler.handle_end(&mut data, out)?;
        out.flush()?;

        tracing::debug!(
            structure = %structure.identifier(),
            states = structure.len(),
            "Kripke structure rendered"
        );
        Ok(())
    }
}

/// Renders a structure as a GraphViz digraph
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphVizViewHandler;

impl GraphVizViewHandler {
    fn clock_format() -> ExpressionFormat<u64> {
        ExpressionFormat {
            less_than: Box::new(|l, r| format!("{l} &lt; {r}")),
            less_than_equal: Box::new(|l, r| format!("{l} &le; {r}")),
            equal: Box::new(|l, r| format!("{l} = {r}")),
            not_equal: Box::new(|l, r| format!("{l} &ne; {r}")),
            greater_than: Box::new(|l, r| format!("{l} &gt; {r}")),
            greater_than_equal: Box::new(|l, r| format!("{l} &ge; {r}")),
            and: Box::new(|l, r| format!("{l} &and; {r}")),
            or: Box::new(|l, r| format!("{l} &or; {r}")),
            implies: Box::new(|l, r| format!("{l} &rarr; {r}")),
            not: Box::new(|c| format!("&not;{c}")),
            group: Box::new(|c| format!("&#40;{c}&#41;")),
            ..ExpressionFormat::default()
        }
    }

    fn edge_label(edge: &KripkeEdge) -> String {
        let mut labels = Vec::new();
        if edge.time != 0 {
            labels.push(edge.time.to_string());
        }
        if let Some(clock) = &edge.clock_name {
            if let Some(constraint) = &edge.constraint {
                labels.push(constraint.expression(clock, &Self::clock_format()));
            }
            if edge.reset_clock {
                labels.push(format!("{clock} := 0"));
            }
        }
        labels.join(", ")
    }

    fn format_properties(list: &KripkeStatePropertyList, indent: usize) -> String {
        let pad = "  ".repeat(indent + 1);
        list.iter()
            .map(|(key, value)| format!("\\l{pad}{key} = {}", Self::format_property(value, indent + 1)))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn format_property(property: &KripkeStateProperty, indent: usize) -> String {
        match property {
            KripkeStateProperty::Optional(None) => "nil".to_string(),
            KripkeStateProperty::Optional(Some(value)) => Self::format_property(value, indent),
            KripkeStateProperty::Collection(items) if items.is_empty() => "[]".to_string(),
            KripkeStateProperty::Collection(items) => {
                let items: Vec<_> = items
                    .iter()
                    .map(|item| Self::format_property(item, indent + 1))
                    .collect();
                format!("[{}]", items.join(", "))
            }
            KripkeStateProperty::Compound(list) => {
                format!("{{{}\\l{}}}", Self::format_properties(list, indent + 1), "  ".repeat(indent))
            }
            KripkeStateProperty::String(s) => s.replace('"', "\\\""),
            other => other.to_string(),
        }
    }
}

impl KripkeStructureViewHandler for GraphVizViewHandler {
    fn handle_start(&mut self, _data: &mut ViewData<'_>, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "digraph finite_state_machine {{")?;
        Ok(())
    }

    fn handle_state(
        &mut self,
        data: &mut ViewData<'_>,
        state: &KripkeState,
        id: usize,
        is_initial: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        let shape = if state.is_accepting() { "doublecircle" } else { "circle" };
        let label = if state.properties().is_empty() {
            id.to_string()
        } else {
            format!("{}\\l", Self::format_properties(state.properties(), 1))
        };
        if is_initial {
            writeln!(out, "node [shape=point] si{id};")?;
            data.add_initial(id, id);
        }
        writeln!(out, "node [shape={shape}, label=\"{label}\"]; s{id};")?;
        Ok(())
    }

    fn handle_effects(
        &mut self,
        data: &mut ViewData<'_>,
        state: &KripkeState,
        id: usize,
        out: &mut dyn Write,
    ) -> Result<()> {
        for edge in state.edges() {
            let target = data.fetch_id(&edge.target)?;
            let label = if data.using_clocks() {
                Self::edge_label(edge)
            } else {
                String::new()
            };
            if label.is_empty() {
                writeln!(out, "s{id} -> s{target};")?;
            } else {
                writeln!(out, "s{id} -> s{target} [ label=\"{label}\" ];")?;
            }
        }
        Ok(())
    }

    fn handle_initials(
        &mut self,
        _data: &mut ViewData<'_>,
        initials: &[(usize, usize)],
        out: &mut dyn Write,
    ) -> Result<()> {
        for (pseudo, id) in initials {
            writeln!(out, "si{pseudo} -> s{id};")?;
        }
        Ok(())
    }

    fn handle_end(&mut self, _data: &mut ViewData<'_>, out: &mut dyn Write) -> Result<()> {
        write!(out, "}}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::structure::InMemoryKripkeStructure;

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl KripkeStructureViewHandler for Trace {
        fn handle_start(&mut self, _: &mut ViewData<'_>, out: &mut dyn Write) -> Result<()> {
            self.0.push("start".into());
            writeln!(out, "start")?;
            Ok(())
        }

        fn handle_state(
            &mut self,
            data: &mut ViewData<'_>,
            _: &KripkeState,
            id: usize,
            is_initial: bool,
            out: &mut dyn Write,
        ) -> Result<()> {
            self.0.push(format!("state {id}"));
            if is_initial {
                data.add_initial(100 + id, id);
            }
            writeln!(out, "state {id}")?;
            Ok(())
        }

        fn handle_effects(
            &mut self,
            data: &mut ViewData<'_>,
            state: &KripkeState,
            id: usize,
            out: &mut dyn Write,
        ) -> Result<()> {
            self.0.push(format!("effects {id}"));
            for edge in state.edges() {
                writeln!(out, "edge {id} {}", data.fetch_id(&edge.target)?)?;
            }
            Ok(())
        }

        fn handle_initials(
            &mut self,
            _: &mut ViewData<'_>,
            initials: &[(usize, usize)],
            out: &mut dyn Write,
        ) -> Result<()> {
            self.0.push("initials".into());
            for (pseudo, id) in initials {
                writeln!(out, "initial {pseudo} {id}")?;
            }
            Ok(())
        }

        fn handle_end(&mut self, _: &mut ViewData<'_>, out: &mut dyn Write) -> Result<()> {
            self.0.push("end".into());
            write!(out, "end")?;
            Ok(())
        }
    }

    fn structure() -> InMemoryKripkeStructure {
        let a = KripkeStatePropertyList::new().with("n", 0_i64);
        let b = KripkeStatePropertyList::new().with("n", 1_i64);
        let mut structure = InMemoryKripkeStructure::new("view");
        let first = structure.add(a.clone(), true);
        let second = structure.add(b.clone(), false);
        structure
            .add_edge(KripkeEdge::new(b).with_clock("c", Constraint::LessThan(5)).with_reset_clock(true), first)
            .unwrap();
        structure.add_edge(KripkeEdge::new(a), second).unwrap();
        structure
    }

    #[test]
    fn test_edges_follow_initials() {
        let structure = structure();
        let mut view = GenericKripkeStructureView::new(Trace::default());
        let mut out = Vec::new();
        view.generate(&structure, &mut out).unwrap();

        assert_eq!(
            view.handler().0,
            vec!["start", "state 0", "effects 0", "state 1", "effects 1", "initials", "end"]
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "start\nstate 0\nstate 1\ninitial 100 0\nedge 0 1\nedge 1 0\nend"
        );
    }

    #[test]
    fn test_graphviz_output() {
        let structure = structure();
        let mut view = GenericKripkeStructureView::new(GraphVizViewHandler).with_clocks(true);
        let mut out = Vec::new();
        view.generate(&structure, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("digraph finite_state_machine {\n"));
        assert!(text.contains("node [shape=point] si0;"));
        assert!(text.contains("si0 -> s0;"));
        assert!(text.contains("s0 -> s1 [ label=\"c &le; 4, c := 0\" ];"));
        assert!(text.contains("s1 -> s0;"));
        assert!(text.ends_with('}'));
    }

    #[test]
    fn test_unknown_edge_target_is_reported() {
        let mut structure = InMemoryKripkeStructure::new("dangling");
        let id = structure.add(KripkeStatePropertyList::new(), true);
        structure
            .add_edge(KripkeEdge::new(KripkeStatePropertyList::new().with("n", 9_i64)), id)
            .unwrap();
        let mut view = GenericKripkeStructureView::new(GraphVizViewHandler);
        let result = view.generate(&structure, &mut Vec::new());
        assert!(matches!(result, Err(KripkeError::UnknownTarget { .. })));
    }
}
