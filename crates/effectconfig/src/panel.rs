use std::fmt;
use std::time::Duration;

use crate::{
    EffectSettings, WrapMode, COUNT_MAX, COUNT_MIN, DURATION_MAX, DURATION_MIN, SMOOTHNESS_MAX,
    SMOOTHNESS_MIN,
};

pub const SMOOTHNESS: &str = "smoothness";
pub const COUNT: &str = "count";
pub const ANIMATION_DURATION: &str = "animationDuration";
pub const WRAPPING: &str = "wrapping";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PanelError {
    #[error("no binding named '{0}'")]
    UnknownField(String),
    #[error("binding '{name}' expects a {expected} value")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("'{value}' is not an option of binding '{name}'")]
    UnknownOption { name: String, value: String },
    #[error("binding '{0}' needs a finite number")]
    NotFinite(String),
}

/// Value carried by a panel edit.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Choice(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(value) => write!(f, "{value}"),
            ParamValue::Choice(label) => f.write_str(label),
        }
    }
}

/// Accepted values for a binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Range { min: f64, max: f64, step: f64 },
    Options(Vec<&'static str>),
}

impl Constraint {
    fn normalize(&self, name: &str, value: &ParamValue) -> Result<ParamValue, PanelError> {
        match (self, value) {
            (Constraint::Range { .. }, ParamValue::Number(raw)) if !raw.is_finite() => {
                Err(PanelError::NotFinite(name.to_string()))
            }
            (Constraint::Range { min, max, step }, ParamValue::Number(raw)) => {
                Ok(ParamValue::Number(snap(*raw, *min, *max, *step)))
            }
            (Constraint::Options(options), ParamValue::Choice(raw)) => options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(raw.trim()))
                .map(|option| ParamValue::Choice((*option).to_string()))
                .ok_or_else(|| PanelError::UnknownOption {
                    name: name.to_string(),
                    value: raw.clone(),
                }),
            (Constraint::Range { .. }, ParamValue::Choice(_)) => Err(PanelError::TypeMismatch {
                name: name.to_string(),
                expected: "numeric",
            }),
            (Constraint::Options(_), ParamValue::Number(_)) => Err(PanelError::TypeMismatch {
                name: name.to_string(),
                expected: "choice",
            }),
        }
    }

    fn step(&self, name: &str, current: &ParamValue, steps: i32) -> Result<ParamValue, PanelError> {
        match (self, current) {
            (Constraint::Range { step, .. }, ParamValue::Number(value)) => {
                self.normalize(name, &ParamValue::Number(value + f64::from(steps) * step))
            }
            (Constraint::Options(options), ParamValue::Choice(label)) if !options.is_empty() => {
                let position = options
                    .iter()
                    .position(|option| option == label)
                    .unwrap_or(0) as i64;
                let len = options.len() as i64;
                let next = (position + i64::from(steps)).rem_euclid(len) as usize;
                Ok(ParamValue::Choice(options[next].to_string()))
            }
            _ => self.normalize(name, current),
        }
    }
}

/// Clamps into `[min, max]`, snaps to the step grid anchored at `min`, and
/// trims float noise to the step's decimal precision.
fn snap(value: f64, min: f64, max: f64, step: f64) -> f64 {
    let clamped = value.clamp(min, max);
    if step <= 0.0 {
        return clamped;
    }
    let steps = ((clamped - min) / step).round();
    let snapped = (min + steps * step).clamp(min, max);
    let scale = 10f64.powi(step_decimals(step));
    (snapped * scale).round() / scale
}

fn step_decimals(step: f64) -> i32 {
    let mut scaled = step;
    let mut decimals = 0;
    while decimals < 9 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        decimals += 1;
    }
    decimals
}

type ChangeCallback<T> = Box<dyn FnMut(&mut T, &ParamValue)>;

struct Binding<T> {
    name: &'static str,
    constraint: Constraint,
    value: ParamValue,
    on_change: ChangeCallback<T>,
}

/// Table of named, constrained values that forward edits into a target.
///
/// The panel keeps its own copy of each value (what a control surface would
/// display) and calls the binding's callback with the normalized value
/// whenever an edit actually changes it.
pub struct ParameterPanel<T> {
    bindings: Vec<Binding<T>>,
}

impl<T> Default for ParameterPanel<T> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<T> ParameterPanel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding. Re-registering a name replaces the old binding.
    pub fn add_binding<F>(
        &mut self,
        name: &'static str,
        initial: ParamValue,
        constraint: Constraint,
        on_change: F,
    ) -> Result<(), PanelError>
    where
        F: FnMut(&mut T, &ParamValue) + 'static,
    {
        let value = constraint.normalize(name, &initial)?;
        self.bindings.retain(|binding| binding.name != name);
        self.bindings.push(Binding {
            name,
            constraint,
            value,
            on_change: Box::new(on_change),
        });
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.iter().map(|binding| binding.name)
    }

    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.binding(name).ok().map(|binding| &binding.value)
    }

    /// Applies an edit. Returns the stored value when it changed, `None` when
    /// the normalized edit matched the current value.
    pub fn set(
        &mut self,
        target: &mut T,
        name: &str,
        value: ParamValue,
    ) -> Result<Option<ParamValue>, PanelError> {
        let binding = self.binding_mut(name)?;
        let normalized = binding.constraint.normalize(name, &value)?;
        Ok(binding.commit(target, normalized))
    }

    /// Moves a range binding by whole steps, or cycles an options binding.
    pub fn nudge(
        &mut self,
        target: &mut T,
        name: &str,
        steps: i32,
    ) -> Result<Option<ParamValue>, PanelError> {
        let binding = self.binding_mut(name)?;
        let next = binding.constraint.step(name, &binding.value, steps)?;
        Ok(binding.commit(target, next))
    }

    fn binding(&self, name: &str) -> Result<&Binding<T>, PanelError> {
        self.bindings
            .iter()
            .find(|binding| binding.name == name)
            .ok_or_else(|| PanelError::UnknownField(name.to_string()))
    }

    fn binding_mut(&mut self, name: &str) -> Result<&mut Binding<T>, PanelError> {
        self.bindings
            .iter_mut()
            .find(|binding| binding.name == name)
            .ok_or_else(|| PanelError::UnknownField(name.to_string()))
    }
}

impl<T> Binding<T> {
    fn commit(&mut self, target: &mut T, value: ParamValue) -> Option<ParamValue> {
        if value == self.value {
            return None;
        }
        self.value = value;
        (self.on_change)(target, &self.value);
        Some(self.value.clone())
    }
}

fn value_seconds(value: &ParamValue) -> Option<Duration> {
    match value {
        ParamValue::Number(seconds) => Duration::try_from_secs_f64(*seconds).ok(),
        ParamValue::Choice(_) => None,
    }
}

/// Builds the panel for the four tunables exposed by the transition effect.
pub fn effect_panel(
    initial: &EffectSettings,
) -> Result<ParameterPanel<EffectSettings>, PanelError> {
    let mut panel = ParameterPanel::new();

    panel.add_binding(
        SMOOTHNESS,
        ParamValue::Number(f64::from(initial.parameters.smoothness)),
        Constraint::Range {
            min: f64::from(SMOOTHNESS_MIN),
            max: f64::from(SMOOTHNESS_MAX),
            step: 0.01,
        },
        |settings: &mut EffectSettings, value| {
            if let ParamValue::Number(value) = value {
                settings.parameters.smoothness = *value as f32;
            }
        },
    )?;

    panel.add_binding(
        COUNT,
        ParamValue::Number(f64::from(initial.parameters.stripe_count)),
        Constraint::Range {
            min: f64::from(COUNT_MIN),
            max: f64::from(COUNT_MAX),
            step: 1.0,
        },
        |settings: &mut EffectSettings, value| {
            if let ParamValue::Number(value) = value {
                settings.parameters.stripe_count = *value as f32;
            }
        },
    )?;

    panel.add_binding(
        ANIMATION_DURATION,
        ParamValue::Number(initial.animation_duration.as_secs_f64()),
        Constraint::Range {
            min: DURATION_MIN.as_secs_f64(),
            max: DURATION_MAX.as_secs_f64(),
            step: 0.1,
        },
        |settings: &mut EffectSettings, value| {
            if let Some(duration) = value_seconds(value) {
                settings.animation_duration = duration;
            }
        },
    )?;

    panel.add_binding(
        WRAPPING,
        ParamValue::Choice(initial.parameters.wrap_mode.label().to_string()),
        Constraint::Options(WrapMode::ALL.iter().map(|mode| mode.label()).collect()),
        |settings: &mut EffectSettings, value| {
            if let ParamValue::Choice(label) = value {
                if let Some(mode) = WrapMode::from_label(label) {
                    settings.parameters.wrap_mode = mode;
                }
            }
        },
    )?;

    Ok(panel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_with_defaults() -> (ParameterPanel<EffectSettings>, EffectSettings) {
        let settings = EffectSettings::default();
        let panel = effect_panel(&settings).expect("panel");
        (panel, settings)
    }

    #[test]
    fn registers_all_effect_bindings() {
        let (panel, _) = panel_with_defaults();
        let names: Vec<_> = panel.names().collect();
        assert_eq!(names, vec![SMOOTHNESS, COUNT, ANIMATION_DURATION, WRAPPING]);
        assert_eq!(panel.value(COUNT), Some(&ParamValue::Number(30.0)));
        assert_eq!(
            panel.value(WRAPPING),
            Some(&ParamValue::Choice("CLAMP_TO_EDGE".into()))
        );
    }

    #[test]
    fn edits_reach_settings_exactly() {
        let (mut panel, mut settings) = panel_with_defaults();
        panel
            .set(&mut settings, COUNT, ParamValue::Number(10.0))
            .unwrap();
        panel
            .set(&mut settings, SMOOTHNESS, ParamValue::Number(0.3))
            .unwrap();
        assert_eq!(settings.parameters.stripe_count, 10.0);
        assert_eq!(settings.parameters.smoothness, 0.3);
    }

    #[test]
    fn values_snap_to_step_and_clamp() {
        let (mut panel, mut settings) = panel_with_defaults();
        let stored = panel
            .set(&mut settings, SMOOTHNESS, ParamValue::Number(0.337))
            .unwrap();
        assert_eq!(stored, Some(ParamValue::Number(0.34)));

        panel
            .set(&mut settings, COUNT, ParamValue::Number(75.0))
            .unwrap();
        assert_eq!(settings.parameters.stripe_count, 50.0);

        panel
            .set(&mut settings, ANIMATION_DURATION, ParamValue::Number(0.0))
            .unwrap();
        assert_eq!(settings.animation_duration, Duration::from_millis(100));
    }

    #[test]
    fn unchanged_edit_skips_callback() {
        let (mut panel, mut settings) = panel_with_defaults();
        let result = panel
            .set(&mut settings, COUNT, ParamValue::Number(30.2))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn nudge_moves_by_step_and_stops_at_bounds() {
        let (mut panel, mut settings) = panel_with_defaults();
        panel.nudge(&mut settings, ANIMATION_DURATION, 2).unwrap();
        assert_eq!(settings.animation_duration, Duration::from_secs(2));

        panel
            .set(&mut settings, COUNT, ParamValue::Number(50.0))
            .unwrap();
        assert_eq!(panel.nudge(&mut settings, COUNT, 1).unwrap(), None);
        panel.nudge(&mut settings, COUNT, -1).unwrap();
        assert_eq!(settings.parameters.stripe_count, 49.0);
    }

    #[test]
    fn wrapping_cycles_through_options() {
        let (mut panel, mut settings) = panel_with_defaults();
        panel.nudge(&mut settings, WRAPPING, 1).unwrap();
        assert_eq!(settings.parameters.wrap_mode, WrapMode::Repeat);
        panel.nudge(&mut settings, WRAPPING, 1).unwrap();
        assert_eq!(settings.parameters.wrap_mode, WrapMode::MirroredRepeat);
        panel.nudge(&mut settings, WRAPPING, 1).unwrap();
        assert_eq!(settings.parameters.wrap_mode, WrapMode::ClampToEdge);
        panel.nudge(&mut settings, WRAPPING, -1).unwrap();
        assert_eq!(settings.parameters.wrap_mode, WrapMode::MirroredRepeat);
    }

    #[test]
    fn rejects_bad_edits() {
        let (mut panel, mut settings) = panel_with_defaults();
        assert_eq!(
            panel.set(&mut settings, "speed", ParamValue::Number(1.0)),
            Err(PanelError::UnknownField("speed".into()))
        );
        assert!(matches!(
            panel.set(&mut settings, WRAPPING, ParamValue::Number(1.0)),
            Err(PanelError::TypeMismatch { .. })
        ));
        assert!(matches!(
            panel.set(&mut settings, WRAPPING, ParamValue::Choice("TILE".into())),
            Err(PanelError::UnknownOption { .. })
        ));
        assert_eq!(settings, EffectSettings::default());
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for name in [SMOOTHNESS, COUNT, ANIMATION_DURATION] {
            for raw in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                let (mut panel, mut settings) = panel_with_defaults();
                let before = panel.value(name).cloned();
                assert_eq!(
                    panel.set(&mut settings, name, ParamValue::Number(raw)),
                    Err(PanelError::NotFinite(name.to_string())),
                    "{name} = {raw}"
                );
                assert_eq!(settings, EffectSettings::default());
                assert_eq!(panel.value(name).cloned(), before);
            }
        }
    }

    #[test]
    fn huge_durations_clamp_to_maximum() {
        let (mut panel, mut settings) = panel_with_defaults();
        panel
            .set(&mut settings, ANIMATION_DURATION, ParamValue::Number(1e300))
            .unwrap();
        assert_eq!(settings.animation_duration, DURATION_MAX);
    }

    #[test]
    fn choice_matching_is_case_insensitive() {
        let (mut panel, mut settings) = panel_with_defaults();
        panel
            .set(&mut settings, WRAPPING, ParamValue::Choice("repeat".into()))
            .unwrap();
        assert_eq!(settings.parameters.wrap_mode, WrapMode::Repeat);
        assert_eq!(
            panel.value(WRAPPING),
            Some(&ParamValue::Choice("REPEAT".into()))
        );
    }
}
