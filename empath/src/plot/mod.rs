//! Antenna-pattern plot utility.
//!
//! A textual command block selects a pattern cut, the steering and tilt to
//! apply, and where the output goes; [`PlotCommands::parse`] reads it,
//! [`PlotCommands::render`] sweeps the grid, and [`PatternPlot::write`]
//! emits the plot and gnuplot files. Every output line also passes through
//! the manager's output-log hook so host-side recorders see it.

use std::path::PathBuf;

use empath_core::antenna::{ElectronicSteering, SteeringMode};
use empath_core::common::{deg, Angle, Freq, GHz, Hz};
use empath_core::manager::EmManager;
use empath_core::radio::{PatternMap, Polarization};
use rayon::prelude::*;

use crate::error::PlotError;

/// Which cut of the pattern to sweep.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlotAxes {
    /// Elevation sweep at zero azimuth.
    Vertical,
    /// Azimuth sweep at zero elevation.
    Horizontal,
    /// The full azimuth-elevation grid.
    #[default]
    Both,
}

/// Gain floor written for a clipped (zero-gain) direction \[dB\].
const CLIPPED_GAIN_DB: f64 = -400.0;

/// Parsed plot command block.
///
/// Angles in the input are degrees, the frequency hertz. Unset commands
/// keep their defaults: the full sphere at 5° steps, 1 GHz, no tilt, no
/// steering, ten values per output line.
#[derive(Clone, Debug)]
pub struct PlotCommands {
    pattern_name: String,
    axes: PlotAxes,
    azimuth_range: (Angle, Angle),
    azimuth_step: Angle,
    elevation_range: (Angle, Angle),
    elevation_step: Angle,
    tilt_angle: Angle,
    frequency: Freq<f64>,
    polarization: Polarization,
    steering_mode: SteeringMode,
    azimuth_steering_limit: Angle,
    elevation_steering_limit: Angle,
    azimuth_loss_exponent: f64,
    elevation_loss_exponent: f64,
    azimuth_steering_angle: Angle,
    elevation_steering_angle: Angle,
    output_file: Option<PathBuf>,
    gnuplot_file: Option<PathBuf>,
    header_lines: [String; 3],
    output_column_limit: usize,
}

impl Default for PlotCommands {
    fn default() -> Self {
        Self {
            pattern_name: String::new(),
            axes: PlotAxes::Both,
            azimuth_range: (-180.0 * deg, 180.0 * deg),
            azimuth_step: 5.0 * deg,
            elevation_range: (-90.0 * deg, 90.0 * deg),
            elevation_step: 5.0 * deg,
            tilt_angle: Angle::ZERO,
            frequency: 1.0 * GHz,
            polarization: Polarization::Default,
            steering_mode: SteeringMode::None,
            azimuth_steering_limit: 60.0 * deg,
            elevation_steering_limit: 60.0 * deg,
            azimuth_loss_exponent: ElectronicSteering::DEFAULT_LOSS_EXPONENT,
            elevation_loss_exponent: ElectronicSteering::DEFAULT_LOSS_EXPONENT,
            azimuth_steering_angle: Angle::ZERO,
            elevation_steering_angle: Angle::ZERO,
            output_file: None,
            gnuplot_file: None,
            header_lines: [String::new(), String::new(), String::new()],
            output_column_limit: 10,
        }
    }
}

fn parse_number(token: Option<&str>, command: &str, line: usize) -> Result<f64, PlotError> {
    let token = token.ok_or_else(|| PlotError::MissingArgument {
        command: command.to_owned(),
        line,
    })?;
    token.parse().map_err(|_| PlotError::BadNumber {
        token: token.to_owned(),
        line,
    })
}

fn parse_word<'a>(
    token: Option<&'a str>,
    command: &str,
    line: usize,
) -> Result<&'a str, PlotError> {
    token.ok_or_else(|| PlotError::MissingArgument {
        command: command.to_owned(),
        line,
    })
}

impl PlotCommands {
    /// Starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a whitespace-separated command block.
    ///
    /// `#` starts a comment. Header-line commands take the remainder of
    /// their line verbatim; everything else is one command and its
    /// arguments per line.
    pub fn parse(input: &str) -> Result<Self, PlotError> {
        let mut commands = Self::default();
        for (index, raw) in input.lines().enumerate() {
            let line = index + 1;
            let text = raw.split('#').next().unwrap_or("").trim();
            if text.is_empty() {
                continue;
            }
            let mut tokens = text.split_whitespace();
            let Some(command) = tokens.next() else {
                continue;
            };
            match command {
                "pattern_name" => {
                    commands.pattern_name = parse_word(tokens.next(), command, line)?.to_owned();
                }
                "axes" => {
                    commands.axes = match parse_word(tokens.next(), command, line)? {
                        "vertical" => PlotAxes::Vertical,
                        "horizontal" => PlotAxes::Horizontal,
                        "both" => PlotAxes::Both,
                        other => {
                            return Err(PlotError::UnknownCommand {
                                token: other.to_owned(),
                                line,
                            })
                        }
                    };
                }
                "azimuth_range" => {
                    let lo = parse_number(tokens.next(), command, line)?;
                    let hi = parse_number(tokens.next(), command, line)?;
                    commands.azimuth_range = (lo * deg, hi * deg);
                }
                "elevation_range" => {
                    let lo = parse_number(tokens.next(), command, line)?;
                    let hi = parse_number(tokens.next(), command, line)?;
                    commands.elevation_range = (lo * deg, hi * deg);
                }
                "azimuth_step" => {
                    commands.azimuth_step = parse_number(tokens.next(), command, line)? * deg;
                }
                "elevation_step" => {
                    commands.elevation_step = parse_number(tokens.next(), command, line)? * deg;
                }
                "tilt_angle" => {
                    commands.tilt_angle = parse_number(tokens.next(), command, line)? * deg;
                }
                "frequency" => {
                    commands.frequency = parse_number(tokens.next(), command, line)? * Hz;
                }
                "polarization" => {
                    commands.polarization = match parse_word(tokens.next(), command, line)? {
                        "default" => Polarization::Default,
                        "horizontal" => Polarization::Horizontal,
                        "vertical" => Polarization::Vertical,
                        "left_circular" => Polarization::LeftCircular,
                        "right_circular" => Polarization::RightCircular,
                        other => {
                            return Err(PlotError::UnknownCommand {
                                token: other.to_owned(),
                                line,
                            })
                        }
                    };
                }
                "electronic_beam_steering" => {
                    commands.steering_mode = match parse_word(tokens.next(), command, line)? {
                        "none" => SteeringMode::None,
                        "azimuth" => SteeringMode::Azimuth,
                        "elevation" => SteeringMode::Elevation,
                        "both" => SteeringMode::Both,
                        other => {
                            return Err(PlotError::UnknownCommand {
                                token: other.to_owned(),
                                line,
                            })
                        }
                    };
                }
                "azimuth_steering_limit" => {
                    commands.azimuth_steering_limit =
                        parse_number(tokens.next(), command, line)? * deg;
                }
                "elevation_steering_limit" => {
                    commands.elevation_steering_limit =
                        parse_number(tokens.next(), command, line)? * deg;
                }
                "azimuth_loss_exponent" => {
                    commands.azimuth_loss_exponent = parse_number(tokens.next(), command, line)?;
                }
                "elevation_loss_exponent" => {
                    commands.elevation_loss_exponent = parse_number(tokens.next(), command, line)?;
                }
                "azimuth_steering_angle" => {
                    commands.azimuth_steering_angle =
                        parse_number(tokens.next(), command, line)? * deg;
                }
                "elevation_steering_angle" => {
                    commands.elevation_steering_angle =
                        parse_number(tokens.next(), command, line)? * deg;
                }
                "output_file" => {
                    commands.output_file =
                        Some(PathBuf::from(parse_word(tokens.next(), command, line)?));
                }
                "gnuplot_file" => {
                    commands.gnuplot_file =
                        Some(PathBuf::from(parse_word(tokens.next(), command, line)?));
                }
                "header_line_1" | "header_line_2" | "header_line_3" => {
                    let rest = text[command.len()..].trim().to_owned();
                    let slot = match command {
                        "header_line_1" => 0,
                        "header_line_2" => 1,
                        _ => 2,
                    };
                    commands.header_lines[slot] = rest;
                }
                "output_column_limit" => {
                    let n = parse_number(tokens.next(), command, line)?;
                    if n < 1.0 {
                        return Err(PlotError::InvalidStep {
                            name: "output column limit",
                            value: n,
                        });
                    }
                    commands.output_column_limit = n as usize;
                }
                other => {
                    return Err(PlotError::UnknownCommand {
                        token: other.to_owned(),
                        line,
                    })
                }
            }
        }
        commands.validate()?;
        Ok(commands)
    }

    fn validate(&self) -> Result<(), PlotError> {
        if self.azimuth_step.radian() <= 0.0 {
            return Err(PlotError::InvalidStep {
                name: "azimuth step",
                value: self.azimuth_step.degree(),
            });
        }
        if self.elevation_step.radian() <= 0.0 {
            return Err(PlotError::InvalidStep {
                name: "elevation step",
                value: self.elevation_step.degree(),
            });
        }
        if self.azimuth_range.1.radian() < self.azimuth_range.0.radian() {
            return Err(PlotError::ReversedRange { name: "azimuth" });
        }
        if self.elevation_range.1.radian() < self.elevation_range.0.radian() {
            return Err(PlotError::ReversedRange { name: "elevation" });
        }
        Ok(())
    }

    /// The pattern identifier named by the block.
    #[must_use]
    pub fn pattern_name(&self) -> &str {
        &self.pattern_name
    }

    fn steering(&self) -> Result<ElectronicSteering, PlotError> {
        Ok(ElectronicSteering::new(self.steering_mode)
            .with_cosine_limits(
                self.azimuth_steering_limit.radian().cos(),
                self.elevation_steering_limit.radian().cos(),
            )?
            .with_loss_exponents(self.azimuth_loss_exponent, self.elevation_loss_exponent))
    }

    fn sweep(range: (Angle, Angle), step: Angle) -> Vec<Angle> {
        let span = range.1.radian() - range.0.radian();
        let count = (span / step.radian() + 1e-9).floor() as usize + 1;
        (0..count)
            .map(|i| range.0 + step * i as f64)
            .collect()
    }

    /// Sweeps the configured grid over the pattern for this block's
    /// polarization.
    ///
    /// Elevation rows are computed in parallel.
    pub fn render(&self, patterns: &PatternMap) -> Result<PatternPlot, PlotError> {
        let steering = self.steering()?;
        let pattern = patterns.pattern(self.polarization);
        let azimuths = match self.axes {
            PlotAxes::Vertical => vec![Angle::ZERO],
            _ => Self::sweep(self.azimuth_range, self.azimuth_step),
        };
        let elevations = match self.axes {
            PlotAxes::Horizontal => vec![Angle::ZERO],
            _ => Self::sweep(self.elevation_range, self.elevation_step),
        };

        let ebs_az = if self.steering_mode.steers_azimuth() {
            self.azimuth_steering_angle
        } else {
            Angle::ZERO
        };
        let ebs_el = if self.steering_mode.steers_elevation() {
            self.elevation_steering_angle
        } else {
            Angle::ZERO
        };
        let loss = steering.loss(ebs_az, ebs_el);

        let gains_db: Vec<f64> = elevations
            .par_iter()
            .flat_map_iter(|&el| {
                let azimuths = &azimuths;
                azimuths.iter().map(move |&az| {
                    let az_off = (az - ebs_az).normalized();
                    let el_off = el - self.tilt_angle - ebs_el;
                    let gain = pattern.gain(self.frequency, az_off, el_off, ebs_az, ebs_el)
                        * loss;
                    if gain.linear() > 0.0 {
                        gain.db()
                    } else {
                        CLIPPED_GAIN_DB
                    }
                })
            })
            .collect();

        Ok(PatternPlot {
            commands: self.clone(),
            azimuths,
            elevations,
            gains_db,
        })
    }
}

/// A rendered pattern cut, ready to write.
#[derive(Clone, Debug)]
pub struct PatternPlot {
    commands: PlotCommands,
    azimuths: Vec<Angle>,
    elevations: Vec<Angle>,
    gains_db: Vec<f64>,
}

impl PatternPlot {
    /// Grid dimensions as `(rows, columns)`: elevations by azimuths.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.elevations.len(), self.azimuths.len())
    }

    /// Gain in dB at a grid cell.
    #[must_use]
    pub fn gain_db(&self, row: usize, column: usize) -> f64 {
        self.gains_db[row * self.azimuths.len() + column]
    }

    fn wrapped(values: impl Iterator<Item = String>, limit: usize, out: &mut Vec<String>) {
        let mut row = Vec::with_capacity(limit);
        for v in values {
            row.push(v);
            if row.len() == limit {
                out.push(row.join(" "));
                row.clear();
            }
        }
        if !row.is_empty() {
            out.push(row.join(" "));
        }
    }

    /// The plot-file lines: three headers, `NROWS NCOLS`, the wrapped
    /// column (azimuth) values, then the row-major gains wrapped at the
    /// column limit.
    #[must_use]
    pub fn plot_lines(&self) -> Vec<String> {
        let limit = self.commands.output_column_limit;
        let mut lines = self.commands.header_lines.to_vec();
        lines.push(format!("{} {}", self.elevations.len(), self.azimuths.len()));
        Self::wrapped(
            self.azimuths.iter().map(|a| format!("{:.2}", a.degree())),
            limit,
            &mut lines,
        );
        for row in 0..self.elevations.len() {
            Self::wrapped(
                (0..self.azimuths.len()).map(|col| format!("{:.3}", self.gain_db(row, col))),
                limit,
                &mut lines,
            );
        }
        lines
    }

    /// The gnuplot-file lines: a commented recipe header, then
    /// `az el gain` triples with a blank line between elevation rows.
    #[must_use]
    pub fn gnuplot_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .commands
            .header_lines
            .iter()
            .map(|h| format!("# {h}"))
            .collect();
        lines.push(format!(
            "# pattern {} at {:.0} Hz: azimuth [deg], elevation [deg], gain [dB]",
            self.commands.pattern_name,
            self.commands.frequency.hz()
        ));
        lines.push("# splot this file using 1:2:3 with lines".to_owned());
        for (row, el) in self.elevations.iter().enumerate() {
            for (col, az) in self.azimuths.iter().enumerate() {
                lines.push(format!(
                    "{:.2} {:.2} {:.3}",
                    az.degree(),
                    el.degree(),
                    self.gain_db(row, col)
                ));
            }
            if row + 1 < self.elevations.len() {
                lines.push(String::new());
            }
        }
        lines
    }

    /// Writes whichever output files the commands configured, routing
    /// every line through the manager's output-log hook.
    pub fn write(&self, manager: &EmManager) -> Result<(), PlotError> {
        if let Some(path) = &self.commands.output_file {
            let lines = self.plot_lines();
            for line in &lines {
                manager.log_output(line);
            }
            std::fs::write(path, lines.join("\n") + "\n")?;
        }
        if let Some(path) = &self.commands.gnuplot_file {
            let lines = self.gnuplot_lines();
            for line in &lines {
                manager.log_output(line);
            }
            std::fs::write(path, lines.join("\n") + "\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use empath_core::common::{dB, Ratio};
    use empath_core::manager::EmObserver;
    use empath_core::pattern::{Sinc, Uniform};
    use std::sync::{Arc, Mutex};

    fn sinc_map() -> PatternMap {
        PatternMap::new(Arc::new(
            Sinc::new(30.0 * dB, 10.0 * deg, 10.0 * deg, Ratio::from_linear(1e-10)).unwrap(),
        ))
    }

    #[test]
    fn parses_the_full_command_set() {
        let text = "\
            pattern_name surveillance  # the search pattern\n\
            axes both\n\
            azimuth_range -30 30\n\
            azimuth_step 10\n\
            elevation_range -10 10\n\
            elevation_step 5\n\
            tilt_angle 2.5\n\
            frequency 3e9\n\
            polarization vertical\n\
            electronic_beam_steering azimuth\n\
            azimuth_steering_limit 45\n\
            azimuth_loss_exponent 2.0\n\
            azimuth_steering_angle 20\n\
            output_file pattern.dat\n\
            gnuplot_file pattern.gp\n\
            header_line_1 surveillance radar pattern\n\
            header_line_2 vertical polarization\n\
            output_column_limit 8\n";
        let c = PlotCommands::parse(text).unwrap();
        assert_eq!(c.pattern_name(), "surveillance");
        assert_eq!(c.axes, PlotAxes::Both);
        approx::assert_abs_diff_eq!(c.azimuth_range.0.degree(), -30.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(c.azimuth_step.degree(), 10.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(c.tilt_angle.degree(), 2.5, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(c.frequency.hz(), 3e9);
        assert_eq!(c.polarization, Polarization::Vertical);
        assert_eq!(c.steering_mode, SteeringMode::Azimuth);
        assert_eq!(c.header_lines[0], "surveillance radar pattern");
        assert_eq!(c.header_lines[2], "");
        assert_eq!(c.output_column_limit, 8);
    }

    #[test]
    fn unknown_commands_carry_their_line() {
        let err = PlotCommands::parse("axes both\nwibble 3\n").unwrap_err();
        match err {
            PlotError::UnknownCommand { token, line } => {
                assert_eq!(token, "wibble");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn steps_and_ranges_are_validated() {
        assert!(PlotCommands::parse("azimuth_step 0\n").is_err());
        assert!(PlotCommands::parse("elevation_range 10 -10\n").is_err());
    }

    #[test]
    fn grid_dimensions_follow_the_axes() {
        let c = PlotCommands::parse(
            "azimuth_range -30 30\nazimuth_step 10\nelevation_range -10 10\nelevation_step 5\n",
        )
        .unwrap();
        let map = sinc_map();
        assert_eq!(c.render(&map).unwrap().dimensions(), (5, 7));

        let c = PlotCommands::parse("axes vertical\nelevation_range -10 10\nelevation_step 5\n")
            .unwrap();
        assert_eq!(c.render(&map).unwrap().dimensions(), (5, 1));

        let c = PlotCommands::parse("axes horizontal\nazimuth_range -30 30\nazimuth_step 10\n")
            .unwrap();
        assert_eq!(c.render(&map).unwrap().dimensions(), (1, 7));
    }

    #[test]
    fn boresight_sits_at_the_peak() {
        let c = PlotCommands::parse(
            "azimuth_range -10 10\nazimuth_step 10\nelevation_range -10 10\nelevation_step 10\n",
        )
        .unwrap();
        let plot = c.render(&sinc_map()).unwrap();
        // Center cell of the 3x3 grid.
        approx::assert_relative_eq!(plot.gain_db(1, 1), 30.0, max_relative = 1e-9);
        assert!(plot.gain_db(1, 0) < 30.0);
    }

    #[test]
    fn tilt_shifts_the_elevation_cut() {
        let c = PlotCommands::parse(
            "axes vertical\nelevation_range -10 10\nelevation_step 5\ntilt_angle 5\n",
        )
        .unwrap();
        let plot = c.render(&sinc_map()).unwrap();
        // The peak moves from row 2 (0°) to row 3 (5°).
        approx::assert_relative_eq!(plot.gain_db(3, 0), 30.0, max_relative = 1e-9);
        assert!(plot.gain_db(2, 0) < 30.0);
    }

    #[test]
    fn steering_past_the_cone_clips_to_the_floor() {
        let c = PlotCommands::parse(
            "axes horizontal\nazimuth_range 0 0\nazimuth_step 5\n\
             electronic_beam_steering azimuth\nazimuth_steering_angle 80\n",
        )
        .unwrap();
        let plot = c.render(&sinc_map()).unwrap();
        approx::assert_abs_diff_eq!(plot.gain_db(0, 0), CLIPPED_GAIN_DB);
    }

    #[test]
    fn plot_file_shape_and_wrapping() {
        let c = PlotCommands::parse(
            "azimuth_range -30 30\nazimuth_step 10\nelevation_range -5 5\nelevation_step 5\n\
             header_line_1 first\nheader_line_2 second\nheader_line_3 third\n\
             output_column_limit 4\n",
        )
        .unwrap();
        let plot = c.render(&sinc_map()).unwrap();
        let lines = plot.plot_lines();
        assert_eq!(lines[0], "first");
        assert_eq!(lines[2], "third");
        assert_eq!(lines[3], "3 7");
        // Seven column values wrap into 4 + 3.
        assert_eq!(lines[4].split_whitespace().count(), 4);
        assert_eq!(lines[5].split_whitespace().count(), 3);
        // Three rows of seven gains, each wrapped the same way.
        assert_eq!(lines.len(), 6 + 3 * 2);
    }

    #[test]
    fn gnuplot_file_separates_rows_with_blank_lines() {
        let c = PlotCommands::parse(
            "azimuth_range 0 10\nazimuth_step 10\nelevation_range 0 5\nelevation_step 5\n",
        )
        .unwrap();
        let plot = c.render(&sinc_map()).unwrap();
        let lines = plot.gnuplot_lines();
        let blanks = lines.iter().filter(|l| l.is_empty()).count();
        assert_eq!(blanks, 1);
        let triples = lines
            .iter()
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .count();
        assert_eq!(triples, 4);
    }

    #[derive(Default)]
    struct CaptureLog(Mutex<Vec<String>>);

    impl EmObserver for CaptureLog {
        fn on_output_log_entry(&self, entry: &str) {
            self.0.lock().unwrap().push(entry.to_owned());
        }
    }

    #[test]
    fn written_files_pass_through_the_log_hook() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pattern.dat");
        let gp = dir.path().join("pattern.gp");
        let text = format!(
            "azimuth_range 0 10\nazimuth_step 10\nelevation_range 0 0\nelevation_step 5\n\
             output_file {}\ngnuplot_file {}\n",
            out.display(),
            gp.display()
        );
        let c = PlotCommands::parse(&text).unwrap();
        let plot = c.render(&sinc_map()).unwrap();

        let manager = EmManager::new();
        let log = Arc::new(CaptureLog::default());
        manager.add_observer(log.clone());
        plot.write(&manager).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.lines().count(), plot.plot_lines().len());
        assert!(gp.exists());
        let captured = log.0.lock().unwrap();
        assert_eq!(
            captured.len(),
            plot.plot_lines().len() + plot.gnuplot_lines().len()
        );
    }

    #[test]
    fn polarization_selects_the_keyed_pattern() {
        let mut map = PatternMap::new(Arc::new(Uniform::isotropic()));
        map.insert(
            Polarization::Vertical,
            Arc::new(
                Sinc::new(30.0 * dB, 10.0 * deg, 10.0 * deg, Ratio::from_linear(1e-10))
                    .unwrap(),
            ),
        );
        let c = PlotCommands::parse(
            "axes horizontal\nazimuth_range 0 0\nazimuth_step 5\npolarization vertical\n",
        )
        .unwrap();
        approx::assert_relative_eq!(
            c.render(&map).unwrap().gain_db(0, 0),
            30.0,
            max_relative = 1e-9
        );
    }
}
