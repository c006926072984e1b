//! Feasible-region chart for two-variable problems
//!
//! The scene (region polygon, constraint segments, optimum) is computed in
//! plain `f64` geometry; `plotters` only rasterises it to SVG.

pub mod geometry;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::domain::{LpModel, Plot, SolveReport};
use geometry::{axis_limit, clip_constraint, clip_line_to_square, square, Point};

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSettings {
    pub width: u32,
    pub height: u32,
    /// Axis range is the largest optimal coordinate times this factor
    pub axis_scale: f64,
    /// Smallest axis range
    pub min_axis: f64,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 700,
            axis_scale: 2.5,
            min_axis: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintLine {
    pub name: String,
    pub from: Point,
    pub to: Point,
    /// Constraint involves only the x variable
    pub vertical: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotScene {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub limit: f64,
    /// Empty when the region does not intersect the visible square
    pub region: Vec<Point>,
    pub lines: Vec<ConstraintLine>,
    pub optimum: Point,
    pub optimum_label: String,
}

/// Lays out the chart for an optimal two-variable solution
pub fn build_scene(model: &LpModel, report: &SolveReport, settings: &PlotSettings) -> Result<PlotScene> {
    let [x_var, y_var] = model.variables.as_slice() else {
        anyhow::bail!(
            "feasible-region plot needs exactly two variables, got {}",
            model.variables.len()
        );
    };
    let x = report
        .value_of(&x_var.name)
        .with_context(|| format!("no optimal value for {}", x_var.name))?;
    let y = report
        .value_of(&y_var.name)
        .with_context(|| format!("no optimal value for {}", y_var.name))?;

    let limit = axis_limit(x, y, settings.axis_scale, settings.min_axis);

    let mut region = square(limit);
    let mut lines = Vec::new();
    for constraint in &model.constraints {
        let a = constraint.coefficient(&x_var.name);
        let b = constraint.coefficient(&y_var.name);

        region = clip_constraint(&region, a, b, constraint.operator, constraint.rhs);

        if let Some((from, to)) = clip_line_to_square(a, b, constraint.rhs, limit) {
            lines.push(ConstraintLine {
                name: constraint.name.clone(),
                from,
                to,
                vertical: b == 0.0,
            });
        }
    }

    Ok(PlotScene {
        title: format!("Feasible region and optimal solution for '{}'", model.name),
        x_label: x_var.name.clone(),
        y_label: y_var.name.clone(),
        limit,
        region,
        lines,
        optimum: (x, y),
        optimum_label: format!("Optimum ({:.2}, {:.2})", x, y),
    })
}

#[cfg(feature = "plot")]
mod svg {
    use super::PlotScene;
    use anyhow::{anyhow, Result};
    use plotters::prelude::*;

    const LINE_COLORS: [RGBColor; 8] = [
        RGBColor(31, 119, 180),
        RGBColor(255, 127, 14),
        RGBColor(44, 160, 44),
        RGBColor(148, 103, 189),
        RGBColor(140, 86, 75),
        RGBColor(227, 119, 194),
        RGBColor(127, 127, 127),
        RGBColor(23, 190, 207),
    ];

    fn plot_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
        anyhow!("plot rendering failed: {}", e)
    }

    pub fn render(scene: &PlotScene, width: u32, height: u32) -> Result<String> {
        let mut out = String::new();
        {
            let root = SVGBackend::with_string(&mut out, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(&scene.title, ("sans-serif", 20))
                .margin(15)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(0f64..scene.limit, 0f64..scene.limit)
                .map_err(plot_err)?;

            chart
                .configure_mesh()
                .x_desc(scene.x_label.as_str())
                .y_desc(scene.y_label.as_str())
                .draw()
                .map_err(plot_err)?;

            if scene.region.len() >= 3 {
                chart
                    .draw_series(std::iter::once(Polygon::new(
                        scene.region.clone(),
                        BLUE.mix(0.15).filled(),
                    )))
                    .map_err(plot_err)?
                    .label("Feasible region")
                    .legend(|(x, y)| {
                        Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.15).filled())
                    });
            }

            for (idx, line) in scene.lines.iter().enumerate() {
                let color = LINE_COLORS[idx % LINE_COLORS.len()];
                let width = if line.vertical { 1 } else { 2 };
                chart
                    .draw_series(LineSeries::new(
                        vec![line.from, line.to],
                        color.stroke_width(width),
                    ))
                    .map_err(plot_err)?
                    .label(line.name.clone())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
            }

            chart
                .draw_series(std::iter::once(Circle::new(scene.optimum, 6, RED.filled())))
                .map_err(plot_err)?
                .label(scene.optimum_label.clone())
                .legend(|(x, y)| Circle::new((x + 10, y), 5, RED.filled()));

            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(plot_err)?;

            root.present().map_err(plot_err)?;
        }
        Ok(out)
    }
}

#[cfg(feature = "plot")]
fn render_svg(scene: &PlotScene, settings: &PlotSettings) -> Result<String> {
    svg::render(scene, settings.width, settings.height)
}

#[cfg(not(feature = "plot"))]
fn render_svg(_scene: &PlotScene, _settings: &PlotSettings) -> Result<String> {
    Err(anyhow!("plot rendering requires the 'plot' feature to be enabled"))
}

/// Renders the chart and packs it for embedding in an `<img>` tag
pub fn render_feasible_region(
    model: &LpModel,
    report: &SolveReport,
    settings: &PlotSettings,
) -> Result<Plot> {
    let scene = build_scene(model, report, settings)?;
    let svg = render_svg(&scene, settings)?;
    if svg.is_empty() {
        return Err(anyhow!("plot backend produced no output"));
    }
    let data_uri = format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()));
    Ok(Plot { svg, data_uri })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Constraint, Operator, Sense, SolveStatus, VarKind, Variable, VariableValue,
    };
    use std::collections::BTreeMap;

    fn wyndor() -> (LpModel, SolveReport) {
        let var = |name: &str, c: f64| Variable {
            name: name.to_string(),
            kind: VarKind::Continuous,
            objective_coefficient: c,
        };
        let constraint = |id: &str, coefs: &[(&str, f64)], rhs: f64| Constraint {
            id: id.to_string(),
            name: Constraint::default_name(id),
            coefficients: coefs
                .iter()
                .map(|(n, c)| (n.to_string(), *c))
                .collect::<BTreeMap<_, _>>(),
            operator: Operator::Le,
            rhs,
        };
        let model = LpModel {
            name: "Wyndor".to_string(),
            sense: Sense::Maximize,
            variables: vec![var("x", 3.0), var("y", 5.0)],
            constraints: vec![
                constraint("1", &[("x", 1.0)], 4.0),
                constraint("2", &[("y", 2.0)], 12.0),
                constraint("3", &[("x", 3.0), ("y", 2.0)], 18.0),
            ],
        };
        let report = SolveReport {
            problem_name: "Wyndor".to_string(),
            sense: Sense::Maximize,
            status: SolveStatus::Optimal,
            objective_value: Some(36.0),
            // report order differs from declaration order on purpose
            variables: vec![
                VariableValue { name: "y".to_string(), value: Some(6.0) },
                VariableValue { name: "x".to_string(), value: Some(2.0) },
            ],
            constraints_analysis: vec![],
            plot: None,
        };
        (model, report)
    }

    #[test]
    fn test_build_scene() {
        let (model, report) = wyndor();
        let scene = build_scene(&model, &report, &PlotSettings::default()).unwrap();

        assert_eq!(scene.limit, 15.0);
        assert_eq!(scene.optimum, (2.0, 6.0));
        assert_eq!(scene.optimum_label, "Optimum (2.00, 6.00)");
        assert_eq!(scene.x_label, "x");
        assert_eq!(scene.y_label, "y");
        assert_eq!(scene.lines.len(), 3);
        assert!(scene.lines[0].vertical);
        assert!(!scene.lines[2].vertical);
        assert_eq!(scene.region.len(), 5);
        assert!(scene.title.contains("'Wyndor'"));
    }

    #[test]
    fn test_build_scene_requires_two_variables() {
        let (mut model, report) = wyndor();
        model.variables.pop();
        assert!(build_scene(&model, &report, &PlotSettings::default()).is_err());
    }

    #[cfg(feature = "plot")]
    #[test]
    fn test_render_feasible_region() {
        let (model, report) = wyndor();
        let plot = render_feasible_region(&model, &report, &PlotSettings::default()).unwrap();
        assert!(plot.svg.contains("<svg"));
        assert!(plot.data_uri.starts_with("data:image/svg+xml;base64,"));
    }
}
