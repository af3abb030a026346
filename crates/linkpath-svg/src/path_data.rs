//! SVG path data codec.
//!
//! Converts between the SVG `d` attribute and cubic super-paths: one
//! [`ControlTriple`] per on-curve point, so every drawing command becomes
//! a cubic segment between consecutive anchors. Straight segments get
//! handles that sit on their anchors; quadratic curves are
//! degree-elevated. The raw grammar is parsed by the [`svg`] crate.

use svg::node::Value;
use svg::node::element::path::{Command, Data, Position};

use linkpath_engine::{Chain, ControlTriple, Point};

/// Errors raised while converting path data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathDataError {
    /// The path data does not follow the SVG grammar.
    #[error("malformed path data: {0}")]
    Syntax(String),

    /// The path uses a command with no cubic equivalent here.
    #[error("unsupported path command '{0}'")]
    UnsupportedCommand(char),

    /// A command's parameters do not form whole groups.
    #[error("command '{command}' takes parameters in groups of {group}, got {count}")]
    ParameterCount {
        /// The command letter.
        command: char,
        /// Parameters per group.
        group: usize,
        /// Parameters supplied.
        count: usize,
    },
}

/// Accumulates subpaths while walking the commands.
#[derive(Debug, Default)]
struct SuperPathBuilder {
    subpaths: Vec<Vec<ControlTriple>>,
    current: Vec<ControlTriple>,
    cursor: Point,
    subpath_start: Point,
    /// Second control point of the previous cubic, for `S` reflection.
    last_cubic: Option<Point>,
    /// Control point of the previous quadratic, for `T` reflection.
    last_quad: Option<Point>,
}

impl SuperPathBuilder {
    fn resolve(&self, position: Position, x: f64, y: f64) -> Point {
        match position {
            Position::Absolute => Point::new(x, y),
            Position::Relative => Point::new(self.cursor.x + x, self.cursor.y + y),
        }
    }

    fn finish_subpath(&mut self) {
        if !self.current.is_empty() {
            self.subpaths.push(std::mem::take(&mut self.current));
        }
    }

    /// Start an implicit subpath at the cursor when drawing after a close.
    fn ensure_started(&mut self) {
        if self.current.is_empty() {
            self.current.push(ControlTriple::corner(self.cursor));
            self.subpath_start = self.cursor;
        }
    }

    fn move_to(&mut self, p: Point) {
        self.finish_subpath();
        self.current.push(ControlTriple::corner(p));
        self.cursor = p;
        self.subpath_start = p;
        self.last_cubic = None;
        self.last_quad = None;
    }

    fn line_to(&mut self, p: Point) {
        self.ensure_started();
        self.current.push(ControlTriple::corner(p));
        self.cursor = p;
        self.last_cubic = None;
        self.last_quad = None;
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.ensure_started();
        if let Some(last) = self.current.last_mut() {
            last.handle_out = c1;
        }
        self.current.push(ControlTriple::new(c2, p, p));
        self.cursor = p;
        self.last_cubic = Some(c2);
        self.last_quad = None;
    }

    fn quad_to(&mut self, q: Point, p: Point) {
        let from = self.cursor;
        let c1 = Point::new(
            from.x + 2.0 / 3.0 * (q.x - from.x),
            from.y + 2.0 / 3.0 * (q.y - from.y),
        );
        let c2 = Point::new(p.x + 2.0 / 3.0 * (q.x - p.x), p.y + 2.0 / 3.0 * (q.y - p.y));
        self.cubic_to(c1, c2, p);
        self.last_cubic = None;
        self.last_quad = Some(q);
    }

    /// Reflection of `control` about the cursor, or the cursor itself.
    fn reflect(&self, control: Option<Point>) -> Point {
        control.map_or(self.cursor, |c| {
            Point::new(2.0f64.mul_add(self.cursor.x, -c.x), 2.0f64.mul_add(self.cursor.y, -c.y))
        })
    }

    fn close(&mut self) {
        if let Some(last) = self.current.last()
            && last.anchor != self.subpath_start
        {
            self.current.push(ControlTriple::corner(self.subpath_start));
        }
        self.finish_subpath();
        self.cursor = self.subpath_start;
        self.last_cubic = None;
        self.last_quad = None;
    }
}

/// Split `params` into groups of `group`, widened to `f64`.
fn groups(command: char, params: &[f32], group: usize) -> Result<Vec<Vec<f64>>, PathDataError> {
    if params.is_empty() || !params.len().is_multiple_of(group) {
        return Err(PathDataError::ParameterCount {
            command,
            group,
            count: params.len(),
        });
    }
    Ok(params
        .chunks_exact(group)
        .map(|chunk| chunk.iter().copied().map(f64::from).collect())
        .collect())
}

const fn letter(position: Position, upper: char) -> char {
    match position {
        Position::Absolute => upper,
        Position::Relative => upper.to_ascii_lowercase(),
    }
}

/// Parse an SVG `d` attribute into cubic super-path subpaths.
///
/// Each returned subpath has at least one triple. Closing a subpath adds a
/// straight segment back to its start unless the last anchor is already
/// exactly there. An empty `d` yields no subpaths.
///
/// # Errors
///
/// Returns [`PathDataError::Syntax`] for malformed data,
/// [`PathDataError::ParameterCount`] for incomplete parameter groups, and
/// [`PathDataError::UnsupportedCommand`] for elliptical arcs.
pub fn parse_path_data(d: &str) -> Result<Vec<Vec<ControlTriple>>, PathDataError> {
    let data = Data::parse(d).map_err(|e| PathDataError::Syntax(e.to_string()))?;
    let mut b = SuperPathBuilder::default();

    for command in data.iter() {
        match command {
            Command::Move(pos, params) => {
                for (i, g) in groups(letter(*pos, 'M'), params, 2)?.iter().enumerate() {
                    let p = b.resolve(*pos, g[0], g[1]);
                    // Extra pairs after a moveto are implicit linetos.
                    if i == 0 {
                        b.move_to(p);
                    } else {
                        b.line_to(p);
                    }
                }
            }
            Command::Line(pos, params) => {
                for g in groups(letter(*pos, 'L'), params, 2)? {
                    let p = b.resolve(*pos, g[0], g[1]);
                    b.line_to(p);
                }
            }
            Command::HorizontalLine(pos, params) => {
                for g in groups(letter(*pos, 'H'), params, 1)? {
                    let x = match pos {
                        Position::Absolute => g[0],
                        Position::Relative => b.cursor.x + g[0],
                    };
                    b.line_to(Point::new(x, b.cursor.y));
                }
            }
            Command::VerticalLine(pos, params) => {
                for g in groups(letter(*pos, 'V'), params, 1)? {
                    let y = match pos {
                        Position::Absolute => g[0],
                        Position::Relative => b.cursor.y + g[0],
                    };
                    b.line_to(Point::new(b.cursor.x, y));
                }
            }
            Command::CubicCurve(pos, params) => {
                for g in groups(letter(*pos, 'C'), params, 6)? {
                    let c1 = b.resolve(*pos, g[0], g[1]);
                    let c2 = b.resolve(*pos, g[2], g[3]);
                    let p = b.resolve(*pos, g[4], g[5]);
                    b.cubic_to(c1, c2, p);
                }
            }
            Command::SmoothCubicCurve(pos, params) => {
                for g in groups(letter(*pos, 'S'), params, 4)? {
                    let c1 = b.reflect(b.last_cubic);
                    let c2 = b.resolve(*pos, g[0], g[1]);
                    let p = b.resolve(*pos, g[2], g[3]);
                    b.cubic_to(c1, c2, p);
                }
            }
            Command::QuadraticCurve(pos, params) => {
                for g in groups(letter(*pos, 'Q'), params, 4)? {
                    let q = b.resolve(*pos, g[0], g[1]);
                    let p = b.resolve(*pos, g[2], g[3]);
                    b.quad_to(q, p);
                }
            }
            Command::SmoothQuadraticCurve(pos, params) => {
                for g in groups(letter(*pos, 'T'), params, 2)? {
                    let q = b.reflect(b.last_quad);
                    let p = b.resolve(*pos, g[0], g[1]);
                    b.quad_to(q, p);
                }
            }
            Command::EllipticalArc(pos, _) => {
                return Err(PathDataError::UnsupportedCommand(letter(*pos, 'A')));
            }
            Command::Close => b.close(),
        }
    }

    b.finish_subpath();
    Ok(b.subpaths)
}

/// Build an SVG `d` attribute from chains.
///
/// Each chain becomes one subpath: `M` to its first anchor, then one `C`
/// per following triple using the previous triple's outgoing handle and
/// this triple's incoming handle. Empty chains are skipped.
///
/// # Examples
///
/// ```
/// use linkpath_engine::{Chain, ControlTriple, Point};
/// use linkpath_svg::build_path_data;
///
/// let chain = Chain::new(vec![
///     ControlTriple::corner(Point::new(0.0, 0.0)),
///     ControlTriple::corner(Point::new(10.0, 5.0)),
/// ]);
/// assert_eq!(build_path_data(&[chain]), "M0,0 C0,0,10,5,10,5");
/// ```
#[must_use]
pub fn build_path_data(chains: &[Chain]) -> String {
    let mut data = Data::new();
    for chain in chains {
        let Some((first, rest)) = chain.triples().split_first() else {
            continue;
        };
        data = data.move_to((first.anchor.x, first.anchor.y));
        let mut prev = first;
        for triple in rest {
            data = data.cubic_curve_to((
                prev.handle_out.x,
                prev.handle_out.y,
                triple.handle_in.x,
                triple.handle_in.y,
                triple.anchor.x,
                triple.anchor.y,
            ));
            prev = triple;
        }
    }
    String::from(Value::from(data))
}
