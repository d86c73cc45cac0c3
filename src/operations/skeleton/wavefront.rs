use tracing::{debug, trace};

use crate::error::{GeometryError, Result, SkeletonError};
use crate::geometry::FlatFootprint;
use crate::math::polygon_2d::{cross_2d, left_normal, segment_direction};
use crate::math::{is_near_zero_eps, Point2, Vector2};

/// Below this, `1 + n_a . n_b` marks two wavefront edges as antiparallel.
const ANTIPARALLEL_EPS: f64 = 1e-8;

/// A footprint edge; edge `i` runs from footprint vertex `i` to its successor
/// and generates roof face `i`.
#[derive(Debug, Clone, Copy)]
struct WaveEdge {
    origin: Point2,
    dir: Vector2,
    normal: Vector2,
}

/// A skeleton node: where and when the wavefront produced a vertex.
///
/// The first nodes are the footprint vertices, indexed like the footprint.
#[derive(Debug, Clone, Copy)]
pub struct Node {
    pub point: Point2,
    pub time: f64,
}

/// A skeleton arc between two nodes, separating the faces of two edges.
#[derive(Debug, Clone, Copy)]
pub struct Arc {
    pub from: usize,
    pub to: usize,
    pub faces: [usize; 2],
}

/// Output of the wavefront simulation.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub nodes: Vec<Node>,
    pub arcs: Vec<Arc>,
}

/// A vertex of the shrinking wavefront, moving along the bisector of its two
/// edges at unit edge speed.
#[derive(Debug, Clone)]
struct WaveVertex {
    origin: Point2,
    time: f64,
    node: usize,
    left: usize,
    right: usize,
    /// `None` when `left` and `right` are antiparallel.
    velocity: Option<Vector2>,
    prev: usize,
    next: usize,
    active: bool,
}

#[derive(Debug, Clone, Copy)]
enum Event {
    /// The edge between `vertex` and its successor shrinks to a point.
    Edge { vertex: usize, time: f64 },
    /// Reflex `vertex` hits the edge following `segment`.
    Split {
        vertex: usize,
        segment: usize,
        time: f64,
        point: Point2,
    },
}

impl Event {
    fn time(&self) -> f64 {
        match *self {
            Self::Edge { time, .. } | Self::Split { time, .. } => time,
        }
    }

    fn is_edge(&self) -> bool {
        matches!(self, Self::Edge { .. })
    }
}

/// Kinetic simulation of the inward offset of all footprint rings.
///
/// Each event is found by scanning every active vertex, which keeps the
/// bookkeeping simple at the cost of cubic running time.
pub struct Wavefront {
    edges: Vec<WaveEdge>,
    vertices: Vec<WaveVertex>,
    nodes: Vec<Node>,
    arcs: Vec<Arc>,
    now: f64,
    eps: f64,
}

impl Wavefront {
    /// Sets up one wavefront vertex per footprint vertex.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` for rings with fewer than three
    /// vertices, zero-length edges, or rings that do not tile the vertex array.
    pub fn new(footprint: &FlatFootprint, eps: f64) -> Result<Self> {
        let mut edges = Vec::with_capacity(footprint.vertices.len());
        for ring in &footprint.loops {
            if ring.count < 3 {
                return Err(
                    GeometryError::Degenerate("ring with fewer than 3 vertices".into()).into(),
                );
            }
            if ring.start != edges.len() {
                return Err(GeometryError::Degenerate("rings are not contiguous".into()).into());
            }
            for i in ring.indices() {
                let a = &footprint.vertices[i];
                let dir = segment_direction(a, &footprint.vertices[ring.next(i)])?;
                edges.push(WaveEdge {
                    origin: Point2::new(a.x, a.y),
                    dir,
                    normal: left_normal(dir),
                });
            }
        }
        if edges.len() != footprint.vertices.len() {
            return Err(GeometryError::Degenerate("vertices outside any ring".into()).into());
        }

        let mut wave = Self {
            edges,
            vertices: Vec::with_capacity(footprint.vertices.len() * 2),
            nodes: Vec::with_capacity(footprint.vertices.len() * 2),
            arcs: Vec::new(),
            now: 0.0,
            eps,
        };
        for ring in &footprint.loops {
            for i in ring.indices() {
                let p = &footprint.vertices[i];
                let origin = Point2::new(p.x, p.y);
                wave.nodes.push(Node {
                    point: origin,
                    time: 0.0,
                });
                let (left, right) = (ring.prev(i), i);
                wave.vertices.push(WaveVertex {
                    origin,
                    time: 0.0,
                    node: i,
                    left,
                    right,
                    velocity: wave.velocity(left, right),
                    prev: ring.prev(i),
                    next: ring.next(i),
                    active: true,
                });
            }
        }
        Ok(wave)
    }

    /// Runs the simulation until every wavefront vertex has been consumed.
    ///
    /// # Errors
    ///
    /// Returns `SkeletonError::Divergence` if vertices remain without any
    /// pending event, a non-finite time appears, or the event count exceeds
    /// a bound quadratic in the vertex count.
    pub fn run(mut self) -> Result<Skeleton> {
        let total = self.vertices.len();
        let max_events = 8 * total * total + 64;
        let mut pending: Vec<usize> = (0..total).collect();
        self.settle(&mut pending);

        let mut processed = 0usize;
        while self.vertices.iter().any(|v| v.active) {
            processed += 1;
            if processed > max_events {
                return Err(SkeletonError::Divergence(format!(
                    "no convergence after {max_events} events"
                ))
                .into());
            }
            let Some(event) = self.next_event() else {
                let left = self.vertices.iter().filter(|v| v.active).count();
                return Err(SkeletonError::Divergence(format!(
                    "{left} wavefront vertices left without events at t = {}",
                    self.now
                ))
                .into());
            };
            if !event.time().is_finite() {
                return Err(SkeletonError::Divergence("non-finite event time".into()).into());
            }
            self.now = self.now.max(event.time());
            trace!(?event, "wavefront event");
            let created = match event {
                Event::Edge { vertex, .. } => self.edge_event(vertex),
                Event::Split {
                    vertex,
                    segment,
                    point,
                    ..
                } => self.split_event(vertex, segment, point),
            };
            pending.extend(created);
            self.settle(&mut pending);
        }

        debug!(
            "wavefront finished after {processed} events: {} nodes, {} arcs, t = {:.6}",
            self.nodes.len(),
            self.arcs.len(),
            self.now
        );
        Ok(Skeleton {
            nodes: self.nodes,
            arcs: self.arcs,
        })
    }

    fn velocity(&self, left: usize, right: usize) -> Option<Vector2> {
        let (na, nb) = (self.edges[left].normal, self.edges[right].normal);
        let denom = 1.0 + na.dot(&nb);
        (denom > ANTIPARALLEL_EPS).then(|| (na + nb) / denom)
    }

    fn position(&self, v: usize, t: f64) -> Point2 {
        let vx = &self.vertices[v];
        match vx.velocity {
            Some(vel) => vx.origin + vel * (t - vx.time),
            None => vx.origin,
        }
    }

    fn is_reflex(&self, v: usize) -> bool {
        let vx = &self.vertices[v];
        cross_2d(&self.edges[vx.left].dir, &self.edges[vx.right].dir) < -ANTIPARALLEL_EPS
    }

    fn loop_len(&self, v: usize) -> usize {
        let mut count = 1;
        let mut cur = self.vertices[v].next;
        while cur != v && count <= self.vertices.len() {
            cur = self.vertices[cur].next;
            count += 1;
        }
        count
    }

    fn loop_members(&self, v: usize) -> Vec<usize> {
        let mut members = vec![v];
        let mut cur = self.vertices[v].next;
        while cur != v && members.len() <= self.vertices.len() {
            members.push(cur);
            cur = self.vertices[cur].next;
        }
        members
    }

    // --- Event detection ---

    fn next_event(&self) -> Option<Event> {
        let mut best: Option<Event> = None;
        let mut consider = |candidate: Event| {
            let better = match best {
                None => true,
                Some(current) => {
                    let dt = candidate.time() - current.time();
                    dt < -self.eps
                        || (is_near_zero_eps(dt, self.eps) && candidate.is_edge() && !current.is_edge())
                }
            };
            if better {
                best = Some(candidate);
            }
        };
        for v in 0..self.vertices.len() {
            if !self.vertices[v].active || self.vertices[v].velocity.is_none() {
                continue;
            }
            if let Some(time) = self.collapse_time(v) {
                consider(Event::Edge { vertex: v, time });
            }
            if self.is_reflex(v) {
                for event in self.split_candidates(v) {
                    consider(event);
                }
            }
        }
        best
    }

    /// Time at which the edge between `v` and its successor shrinks to a point.
    fn collapse_time(&self, v: usize) -> Option<f64> {
        let a = &self.vertices[v];
        if a.next == v {
            return None;
        }
        let b = &self.vertices[a.next];
        let (Some(va), Some(vb)) = (a.velocity, b.velocity) else {
            return None;
        };
        let d = self.edges[a.right].dir;
        let rate = (vb - va).dot(&d);
        if rate > -1e-12 {
            return None;
        }
        let c0 = (b.origin - a.origin).dot(&d) - vb.dot(&d) * b.time + va.dot(&d) * a.time;
        let t = -c0 / rate;
        (t >= self.now - self.eps).then_some(t.max(self.now))
    }

    /// Points where reflex vertex `v` reaches the interior of an opposite edge.
    fn split_candidates(&self, v: usize) -> Vec<Event> {
        let vx = &self.vertices[v];
        let Some(vel) = vx.velocity else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (segment, a) in self.vertices.iter().enumerate() {
            if !a.active || segment == v || a.next == v {
                continue;
            }
            let e = a.right;
            if e == vx.left || e == vx.right {
                continue;
            }
            let edge = &self.edges[e];
            let closing = 1.0 - vel.dot(&edge.normal);
            if closing <= 1e-9 {
                continue;
            }
            let t = ((vx.origin - edge.origin).dot(&edge.normal) - vel.dot(&edge.normal) * vx.time)
                / closing;
            if !t.is_finite() || t < self.now - self.eps {
                continue;
            }
            let t = t.max(self.now);
            let point = self.position(v, t);
            let start = self.position(segment, t);
            let end = self.position(a.next, t);
            if (point - start).dot(&edge.dir) < -self.eps || (end - point).dot(&edge.dir) < -self.eps
            {
                continue;
            }
            out.push(Event::Split {
                vertex: v,
                segment,
                time: t,
                point,
            });
        }
        out
    }

    // --- Event processing ---

    fn add_node(&mut self, point: Point2) -> usize {
        self.nodes.push(Node {
            point,
            time: self.now,
        });
        self.nodes.len() - 1
    }

    /// Ends vertex `v` at `node`, tracing its path as an arc.
    fn close_vertex(&mut self, v: usize, node: usize) {
        let vx = &mut self.vertices[v];
        vx.active = false;
        if vx.node != node {
            self.arcs.push(Arc {
                from: vx.node,
                to: node,
                faces: [vx.left, vx.right],
            });
        }
    }

    /// Creates a vertex at the current time and links it between `prev` and `next`.
    fn spawn(
        &mut self,
        origin: Point2,
        node: usize,
        (left, right): (usize, usize),
        prev: usize,
        next: usize,
    ) -> usize {
        let w = self.vertices.len();
        self.vertices.push(WaveVertex {
            origin,
            time: self.now,
            node,
            left,
            right,
            velocity: self.velocity(left, right),
            prev,
            next,
            active: true,
        });
        self.vertices[prev].next = w;
        self.vertices[next].prev = w;
        w
    }

    /// Node of vertex `v` at the current time, tracing the path to it.
    fn node_now(&mut self, v: usize) -> usize {
        let vx = &self.vertices[v];
        if is_near_zero_eps(self.now - vx.time, self.eps) || vx.velocity.is_none() {
            return vx.node;
        }
        let (from, faces) = (vx.node, [vx.left, vx.right]);
        let node = self.add_node(self.position(v, self.now));
        self.arcs.push(Arc {
            from,
            to: node,
            faces,
        });
        node
    }

    fn edge_event(&mut self, v: usize) -> Vec<usize> {
        let n = self.vertices[v].next;
        let point = nalgebra::center(&self.position(v, self.now), &self.position(n, self.now));
        match self.loop_len(v) {
            0..=2 => {
                self.finish_two_gon(v);
                Vec::new()
            }
            3 => {
                self.collapse_triangle(v);
                Vec::new()
            }
            _ => {
                let node = self.add_node(point);
                self.close_vertex(v, node);
                self.close_vertex(n, node);
                let edges = (self.vertices[v].left, self.vertices[n].right);
                let (prev, next) = (self.vertices[v].prev, self.vertices[n].next);
                vec![self.spawn(point, node, edges, prev, next)]
            }
        }
    }

    /// A triangle collapses into one peak.
    fn collapse_triangle(&mut self, v: usize) {
        let members = self.loop_members(v);
        let sum = members
            .iter()
            .fold(Vector2::zeros(), |acc, &m| acc + self.position(m, self.now).coords);
        #[allow(clippy::cast_precision_loss)]
        let peak = Point2::from(sum / members.len() as f64);
        let node = self.add_node(peak);
        for m in members {
            self.close_vertex(m, node);
        }
    }

    /// Two vertices whose edges coincide end in a ridge between them.
    fn finish_two_gon(&mut self, v: usize) {
        let n = self.vertices[v].next;
        if n == v {
            self.vertices[v].active = false;
            return;
        }
        let faces = [self.vertices[v].left, self.vertices[v].right];
        let a = self.node_now(v);
        let b = self.node_now(n);
        if a != b {
            self.arcs.push(Arc { from: a, to: b, faces });
        }
        self.vertices[v].active = false;
        self.vertices[n].active = false;
    }

    fn split_event(&mut self, v: usize, segment: usize, point: Point2) -> Vec<usize> {
        let node = self.add_node(point);
        let (prev, next, left, right) = {
            let vx = &self.vertices[v];
            (vx.prev, vx.next, vx.left, vx.right)
        };
        let (e, b) = (self.vertices[segment].right, self.vertices[segment].next);
        self.close_vertex(v, node);
        let first = self.spawn(point, node, (left, e), prev, b);
        let second = self.spawn(point, node, (e, right), segment, next);
        vec![first, second]
    }

    /// A vertex between antiparallel edges slides along their common line to
    /// the nearer neighbour and merges with it.
    fn ridge_run(&mut self, w: usize) -> Vec<usize> {
        let (prev, next, left, right) = {
            let wx = &self.vertices[w];
            (wx.prev, wx.next, wx.left, wx.right)
        };
        let here = self.vertices[w].origin;
        let (pp, pn) = (self.position(prev, self.now), self.position(next, self.now));
        let (dp, dn) = ((pp - here).norm(), (pn - here).norm());

        if is_near_zero_eps(dp - dn, self.eps) {
            let len = self.loop_len(w);
            let meet = nalgebra::center(&pp, &pn);
            let node = self.add_node(meet);
            self.close_vertex(w, node);
            self.close_vertex(prev, node);
            self.close_vertex(next, node);
            if len <= 3 {
                return Vec::new();
            }
            let edges = (self.vertices[prev].left, self.vertices[next].right);
            let (before, after) = (self.vertices[prev].prev, self.vertices[next].next);
            return vec![self.spawn(meet, node, edges, before, after)];
        }

        if dp < dn {
            let node = self.add_node(pp);
            self.close_vertex(w, node);
            self.close_vertex(prev, node);
            let edges = (self.vertices[prev].left, right);
            let before = self.vertices[prev].prev;
            vec![self.spawn(pp, node, edges, before, next)]
        } else {
            let node = self.add_node(pn);
            self.close_vertex(w, node);
            self.close_vertex(next, node);
            let edges = (left, self.vertices[next].right);
            let after = self.vertices[next].next;
            vec![self.spawn(pn, node, edges, prev, after)]
        }
    }

    /// Resolves degenerate configurations created by the last event: tiny
    /// loops, antiparallel vertices and coincident neighbours.
    fn settle(&mut self, pending: &mut Vec<usize>) {
        while let Some(w) = pending.pop() {
            if !self.vertices[w].active {
                continue;
            }
            if self.loop_len(w) <= 2 {
                self.finish_two_gon(w);
                continue;
            }
            if self.vertices[w].velocity.is_none() {
                let created = self.ridge_run(w);
                pending.extend(created);
                continue;
            }
            let here = self.position(w, self.now);
            let (prev, next) = (self.vertices[w].prev, self.vertices[w].next);
            let coincident = |other: usize| {
                self.vertices[other].velocity.is_some()
                    && (self.position(other, self.now) - here).norm() <= self.eps
            };
            let merge_from = if coincident(next) {
                Some(w)
            } else if coincident(prev) {
                Some(prev)
            } else {
                None
            };
            if let Some(first) = merge_from {
                let created = self.edge_event(first);
                pending.extend(created);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::FootprintPolygon;
    use crate::math::Point3;

    fn run(outer: &[(f64, f64)], holes: &[&[(f64, f64)]]) -> Skeleton {
        let ring = |pts: &[(f64, f64)]| pts.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect();
        let fp = FootprintPolygon::new(ring(outer), holes.iter().map(|h| ring(h)).collect());
        Wavefront::new(&fp.flatten(), 1e-6).unwrap().run().unwrap()
    }

    fn max_time(s: &Skeleton) -> f64 {
        s.nodes.iter().map(|n| n.time).fold(0.0, f64::max)
    }

    #[test]
    fn square_collapses_at_half_width() {
        let s = run(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)], &[]);
        assert!((max_time(&s) - 5.0).abs() < 1e-9);
        let top = s.nodes.iter().filter(|n| n.time > 1.0);
        assert!(top.clone().all(|n| (n.point - Point2::new(5.0, 5.0)).norm() < 1e-9));
    }

    #[test]
    fn rectangle_ridge_spans_long_axis() {
        let s = run(&[(0.0, 0.0), (10.0, 0.0), (10.0, 4.0), (0.0, 4.0)], &[]);
        assert!((max_time(&s) - 2.0).abs() < 1e-9);
        let ridge_xs: Vec<f64> = s
            .nodes
            .iter()
            .filter(|n| n.time > 1.0)
            .map(|n| n.point.x)
            .collect();
        assert!(ridge_xs.iter().any(|x| (x - 2.0).abs() < 1e-9));
        assert!(ridge_xs.iter().any(|x| (x - 8.0).abs() < 1e-9));
    }

    #[test]
    fn every_footprint_vertex_gets_an_arc() {
        let s = run(
            &[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (2.0, 2.0), (2.0, 4.0), (0.0, 4.0)],
            &[],
        );
        for i in 0..6 {
            assert!(s.arcs.iter().any(|a| a.from == i), "vertex {i} has no arc");
        }
        assert!((max_time(&s) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hole_ring_is_consumed() {
        let s = run(
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            &[&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)]],
        );
        assert!((max_time(&s) - 2.0).abs() < 1e-9);
        for i in 0..8 {
            assert!(s.arcs.iter().any(|a| a.from == i), "vertex {i} has no arc");
        }
    }

    #[test]
    fn short_ring_is_rejected() {
        let flat = FlatFootprint {
            vertices: vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            loops: vec![crate::geometry::LoopRange::new(0, 2)],
        };
        assert!(Wavefront::new(&flat, 1e-6).is_err());
    }
}
