//! Dashboard-Seite. Serverseitig gerendert in der aktiven Sprache, das
//! Script aktualisiert die Kacheln danach über `/data`.

use std::fmt::Write;

use crate::control::OverrideKind;
use crate::report::StatusView;

/// Zeilen in der Kulturtabelle / im Log-Block
const TOP_CROPS: usize = 4;
const LOG_LINES: usize = 8;

fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn bar_color(score: u8) -> &'static str {
    match score {
        70.. => "#10b981",
        50..=69 => "#3b82f6",
        30..=49 => "#f59e0b",
        _ => "#ef4444",
    }
}

pub fn render(v: &StatusView) -> String {
    let lang = v.state.language;
    let t = lang.strings();
    let best = v.recommendation.best;
    let rating = v.recommendation.rating;

    let mut crops = String::new();
    for r in v.recommendation.ranking.iter().take(TOP_CROPS) {
        let _ = write!(
            crops,
            r#"<div class="row crop"><div style="flex:1">{emoji} {name}</div><b style="color:{c}">{score}%</b><div class="bar"><div style="width:{score}%;background:{c}"></div></div></div>"#,
            emoji = r.crop_id.emoji(),
            name = t.crop(r.crop_id),
            c = bar_color(r.score),
            score = r.score,
        );
    }

    let mut logs = String::new();
    for e in v.logs.iter().take(LOG_LINES) {
        let _ = write!(logs, r#"<div class="log">{}</div>"#, esc(&e.to_string()));
    }

    let mut langs = String::new();
    for l in crate::i18n::Language::ALL {
        let sel = if l == lang { " selected" } else { "" };
        let _ = write!(langs, r#"<option value="{}"{sel}>{}</option>"#, l.code(), l.native_name());
    }

    let mut alerts = String::new();
    if v.low_tank {
        let _ = write!(alerts, r#"<div class="alert">⚠️ {}</div>"#, t.low_tank);
    }
    if let Some((kind, left)) = v.override_remaining {
        let label = match kind {
            OverrideKind::ForcedWatering => t.force_water,
            OverrideKind::ManualRun => t.manual_run,
        };
        let _ = write!(alerts, r#"<div class="alert">💧 {label} {}s</div>"#, left.as_secs());
    }

    let (rain_txt, pump_txt) = (
        if v.sample.rain_active { format!("🌧️ {}", t.raining) } else { format!("☀️ {}", t.no_rain) },
        if v.state.relay_on { format!("💧 {}", t.on) } else { format!("❌ {}", t.off) },
    );
    let mode_txt = match v.state.mode {
        crate::control::Mode::Auto => t.mode_auto,
        crate::control::Mode::Manual => t.mode_manual,
    };

    format!(
        r#"<!doctype html>
<html lang="{code}">
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width,initial-scale=1" />
<title>{title}</title>
<style>
  body {{ font: 16px/1.4 system-ui, sans-serif; margin: 0; padding: 16px; background:#0b1020; color:#eaeef5; }}
  h1 {{ font-weight: 600; margin: 0 0 12px; }}
  .grid {{ display:grid; gap:12px; grid-template-columns: repeat(auto-fit, minmax(200px,1fr)); }}
  .card {{ background:#111831; border-radius:14px; padding:14px; box-shadow: 0 1px 0 #0008 inset, 0 1px 20px #0006; margin-bottom:12px; }}
  .kpi {{ font-size:28px; font-weight:700; margin-top:6px; }}
  button {{ font-size:16px; padding:10px 14px; border-radius:10px; border:0; background:#2d5bff; color:#fff; cursor:pointer; }}
  button:active {{ transform: translateY(1px); }}
  .row {{ display:flex; gap:10px; align-items:center; flex-wrap:wrap; }}
  .bar {{ width:100px; height:8px; background:#2a3355; border-radius:4px; overflow:hidden; }}
  .bar div {{ height:100%; }}
  .alert {{ background:#3b1d1d; border-radius:10px; padding:8px 12px; margin-bottom:8px; }}
  .log {{ font-family: monospace; font-size:13px; opacity:.85; }}
</style>
<div class="row" style="justify-content:space-between">
  <h1>{title}</h1>
  <label>{language_lbl} <select id="lang">{langs}</select></label>
</div>
{alerts}
<div class="card" style="border-left:6px solid {advice_color}">
  <div>{suggestion} <b>{advice}</b> ({status})</div>
  <div>{season_lbl} {season}</div>
</div>
<div class="grid">
  <div class="card"><div>{temperature}</div><div id="temp" class="kpi">{temp:.1} °C</div></div>
  <div class="card"><div>{humidity}</div><div id="hum" class="kpi">{hum:.0} %</div></div>
  <div class="card"><div>{soil_lbl}</div><div id="soil" class="kpi">{soil} %</div></div>
  <div class="card"><div>{tank_lbl}</div><div id="tank" class="kpi">{tank} %</div></div>
  <div class="card"><div>{rain_lbl}</div><div id="rain" class="kpi">{rain_txt}</div></div>
  <div class="card"><div>{pump_lbl}</div><div id="pump" class="kpi">{pump_txt}</div><div>{mode_lbl}: {mode_txt}</div></div>
</div>
<div class="card" style="border-left:6px solid {rating_color}">
  <div>{predicted}</div>
  <div class="kpi">{best_emoji} {best_name}</div>
  <div>{score_lbl} {best_score}% · {stars} {rating}</div>
  {crops}
</div>
<div class="card row">
  <button data-a="pump">{toggle_pump}</button>
  <button data-a="mode">{change_mode}</button>
  <button data-a="force">{force_water}</button>
  <button data-a="stop">{stop_water}</button>
</div>
<div class="card">
  <div class="row" style="justify-content:space-between"><b>{logs_lbl}</b><button data-a="clear">{clear_logs}</button></div>
  {logs}
</div>
<script>
document.querySelectorAll('button[data-a]').forEach(b => b.addEventListener('click', async () => {{
  try {{ await fetch('/control?a=' + b.dataset.a); location.reload(); }} catch (e) {{ console.log(e); }}
}}));
document.getElementById('lang').addEventListener('change', async (ev) => {{
  try {{ await fetch('/lang?l=' + ev.target.value); location.reload(); }} catch (e) {{ console.log(e); }}
}});
async function refresh() {{
  try {{
    const d = await (await fetch('/data')).json();
    document.getElementById('temp').textContent = d.temp.toFixed(1) + ' °C';
    document.getElementById('hum').textContent = d.humidity.toFixed(0) + ' %';
    document.getElementById('soil').textContent = d.soil + ' %';
    document.getElementById('tank').textContent = d.tank + ' %';
  }} catch (e) {{
    console.log(e);
  }}
}}
setInterval(refresh, 3000);
</script>
</html>
"#,
        code = lang.code(),
        title = t.title,
        language_lbl = t.language,
        langs = langs,
        alerts = alerts,
        advice_color = v.advice.status.color(),
        suggestion = t.suggestion,
        advice = v.advice.message,
        status = t.status(v.advice.status),
        season_lbl = t.current_season,
        season = t.season(v.season),
        temperature = t.temperature,
        temp = v.sample.temperature_c,
        humidity = t.humidity,
        hum = v.sample.humidity_pct,
        soil_lbl = t.soil_moisture,
        soil = v.sample.soil_pct,
        tank_lbl = t.tank_level,
        tank = v.sample.tank_pct,
        rain_lbl = t.rain_status,
        rain_txt = rain_txt,
        pump_lbl = t.pump,
        pump_txt = pump_txt,
        mode_lbl = t.mode,
        mode_txt = mode_txt,
        rating_color = rating.color(),
        predicted = t.predicted_crop,
        best_emoji = best.crop_id.emoji(),
        best_name = t.crop(best.crop_id),
        score_lbl = t.crop_score,
        best_score = best.score,
        stars = rating.stars(),
        rating = t.rating(rating),
        crops = crops,
        toggle_pump = t.toggle_pump,
        change_mode = t.change_mode,
        force_water = t.force_water,
        stop_water = t.stop_water,
        logs_lbl = t.logs,
        clear_logs = t.clear_logs,
        logs = logs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;
    use crate::control::{Command, IrrigationController, Relay, SharedController};
    use crate::i18n::Language;
    use crate::season::Month;
    use crate::sensor::SensorSample;

    struct NullRelay;

    impl Relay for NullRelay {
        fn set(&mut self, _on: bool) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn view_after(cfg: ControlConfig, tank_pct: u8, cmd: Option<Command>) -> StatusView {
        let ctrl = SharedController::new(IrrigationController::new(cfg, Box::new(NullRelay), None));
        ctrl.cycle(&SensorSample {
            temperature_c: 28.0,
            humidity_pct: 65.0,
            soil_raw: 2250,
            soil_pct: 50,
            tank_raw: 1900,
            tank_pct,
            rain_active: false,
        });
        if let Some(cmd) = cmd {
            ctrl.command(cmd);
        }
        StatusView::capture(&ctrl, Month::new(7).unwrap()).unwrap()
    }

    fn alert_lines(page: &str) -> Vec<&str> {
        page.lines().filter(|l| l.contains(r#"class="alert""#)).collect()
    }

    #[test]
    fn override_alert_names_the_running_action() {
        let t = Language::En.strings();

        let page = render(&view_after(ControlConfig::default(), 60, Some(Command::TogglePump)));
        let alerts = alert_lines(&page);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains(t.manual_run));
        assert!(!alerts[0].contains(t.force_water));

        let page = render(&view_after(ControlConfig::default(), 60, Some(Command::ForceWater)));
        assert!(alert_lines(&page)[0].contains(t.force_water));
    }

    #[test]
    fn low_tank_alert_uses_configured_limit() {
        let t = Language::En.strings();
        let raised = ControlConfig {
            tank_critical_pct: 40,
            ..ControlConfig::default()
        };
        let page = render(&view_after(raised, 30, None));
        assert!(alert_lines(&page).iter().any(|l| l.contains(t.low_tank)));

        let page = render(&view_after(ControlConfig::default(), 30, None));
        assert!(alert_lines(&page).is_empty());
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(esc("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }

    #[test]
    fn bar_colors() {
        assert_eq!(bar_color(100), "#10b981");
        assert_eq!(bar_color(55), "#3b82f6");
        assert_eq!(bar_color(30), "#f59e0b");
        assert_eq!(bar_color(15), "#ef4444");
    }
}
