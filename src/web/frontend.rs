//! Embedded HTML/CSS/JS frontend for the pulsecheck web dashboard.
//!
//! Both pages are compiled into the binary as string constants.
//! No external assets, no build tools, no CDN dependencies.

/// Shared stylesheet, spliced into both pages.
macro_rules! style {
    () => {
        r##"<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1100px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 22px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); font-weight: 700; }

.nav-profile { display: flex; align-items: center; gap: 10px; }
.nav-profile img { width: 36px; height: 36px; border-radius: 50%; }
.nav-profile .timer { color: var(--text-muted); font-family: var(--mono); font-size: 12px; }

button, .button {
  padding: 8px 16px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--surface);
  color: var(--text);
  font-size: 13px;
  cursor: pointer;
  text-decoration: none;
}
button:hover, .button:hover { border-color: var(--accent); }
.button.primary { background: var(--accent); border-color: var(--accent); color: #fff; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 12px; }

.profile-card { display: flex; align-items: center; gap: 20px; }
.profile-card img { width: 80px; height: 80px; border-radius: 50%; }
.profile-card .muted { color: var(--text-muted); }

.stats-grid {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
  gap: 16px;
  margin-bottom: 16px;
}
.stat-card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  text-align: center;
}
.stat-card .value { font-size: 32px; font-weight: 700; font-family: var(--mono); color: var(--accent); }
.stat-card .label { font-size: 12px; color: var(--text-muted); text-transform: uppercase; letter-spacing: 0.5px; }
.stat-card .rating { margin-top: 6px; font-weight: 600; }

.chart-wrap { display: flex; align-items: center; justify-content: center; gap: 24px; }
.legend div { display: flex; align-items: center; gap: 8px; }
.legend span.swatch { width: 12px; height: 12px; border-radius: 2px; display: inline-block; }

ul.recs { margin-left: 20px; }
ul.recs li { margin-bottom: 4px; }

.posts { max-height: 300px; overflow: auto; }
.post { border-bottom: 1px solid var(--border); padding: 8px 0; }
.post .meta { color: var(--text-muted); font-size: 12px; }

.empty, .loading { color: var(--text-muted); text-align: center; padding: 24px; }

.login { max-width: 420px; margin: 120px auto; text-align: center; }
.login p { color: var(--text-muted); margin: 12px 0 24px; }
</style>"##
    };
}

/// Login landing page. `{{login_url}}` is replaced with the configured,
/// HTML-escaped login surface URL.
pub const LOGIN_HTML: &str = concat!(
    r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>pulsecheck</title>
"##,
    style!(),
    r##"
</head>
<body>
<div class="app">
  <div class="card login">
    <h1><span class="logo">pulsecheck</span></h1>
    <p>See how positive, balanced, private and respectful your social activity is.</p>
    <a class="button primary" href="{{login_url}}">Log in to continue</a>
  </div>
</div>
</body>
</html>
"##
);

/// The dashboard single page.
pub const DASHBOARD_HTML: &str = concat!(
    r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Digital Responsibility Dashboard</title>
"##,
    style!(),
    r##"
</head>
<body>
<div class="app">
  <header>
    <h1><span class="logo">pulsecheck</span> Digital Responsibility Dashboard</h1>
    <div class="nav-profile" id="nav-profile"></div>
  </header>
  <div id="content"><div class="loading">Loading dashboard...</div></div>
</div>

<script>
const EXPIRED = "Your session expired. Please login again.";
// Longer setTimeout delays fire immediately.
const MAX_TIMER_MS = 2147483647;

function esc(s) {
  const d = document.createElement('div');
  d.textContent = s == null ? '' : String(s);
  return d.innerHTML;
}

function sessionExpired(message) {
  alert(message || EXPIRED);
  fetch('/api/logout', { method: 'POST' }).finally(() => { window.location = '/'; });
}

async function loadSession() {
  const res = await fetch('/api/session');
  const s = await res.json();
  if (!s.active) return;

  const nav = document.getElementById('nav-profile');
  let html = '';
  if (s.profile) {
    if (s.profile.picture_url) html += '<img src="' + esc(s.profile.picture_url) + '" alt="profile">';
    html += '<strong>' + esc(s.profile.name) + '</strong>';
  }
  html += '<span class="timer" id="timer"></span><button id="logout">Log out</button>';
  nav.innerHTML = html;
  document.getElementById('logout').onclick = () => {
    fetch('/api/logout', { method: 'POST' }).finally(() => { window.location = '/'; });
  };

  const deadline = Date.now() + s.expires_in_ms;
  const arm = () => {
    const left = deadline - Date.now();
    if (left <= 0) { sessionExpired(); return; }
    setTimeout(arm, Math.min(left, MAX_TIMER_MS));
  };
  arm();
  const tick = () => {
    const left = Math.max(0, Math.round((deadline - Date.now()) / 1000));
    const el = document.getElementById('timer');
    if (el) el.textContent = Math.floor(left / 60) + 'm ' + (left % 60) + 's';
  };
  tick();
  setInterval(tick, 1000);
}

function drawPie(canvas, slices) {
  const ctx = canvas.getContext('2d');
  const total = slices.reduce((n, s) => n + s.count, 0);
  const cx = canvas.width / 2, cy = canvas.height / 2, r = Math.min(cx, cy) - 4;
  let start = -Math.PI / 2;
  for (const s of slices) {
    if (s.count === 0) continue;
    const end = start + (s.count / total) * Math.PI * 2;
    ctx.beginPath();
    ctx.moveTo(cx, cy);
    ctx.arc(cx, cy, r, start, end);
    ctx.closePath();
    ctx.fillStyle = s.color;
    ctx.fill();
    ctx.strokeStyle = '#0d1117';
    ctx.lineWidth = 1;
    ctx.stroke();
    start = end;
  }
}

function render(d) {
  let html = '';

  if (d.profile) {
    const p = d.profile;
    html += '<div class="card profile-card">';
    if (p.picture_url) html += '<img src="' + esc(p.picture_url) + '" alt="Profile">';
    html += '<div><h2>' + esc(p.name) + '</h2>'
      + '<div class="muted">Birthday: ' + esc(p.birthday) + '</div>'
      + '<div class="muted">Gender: ' + esc(p.gender) + '</div></div></div>';
  }

  html += '<div class="stats-grid">';
  for (const m of d.metrics) {
    html += '<div class="stat-card"><div class="value">' + esc(m.value) + '</div>'
      + '<div class="label">' + esc(m.title) + '</div>'
      + '<div class="rating">' + esc(m.rating) + '</div></div>';
  }
  html += '</div>';

  html += '<div class="card"><h2>Sentiment</h2>';
  if (d.chart) {
    html += '<div class="chart-wrap"><canvas id="pie" width="240" height="240"></canvas><div class="legend">';
    for (const s of d.chart) {
      html += '<div><span class="swatch" style="background:' + esc(s.color) + '"></span>'
        + esc(s.label) + ': ' + s.count + '</div>';
    }
    html += '</div></div>';
  } else {
    html += '<div class="empty">No sentiment data to show.</div>';
  }
  html += '</div>';

  html += '<div class="card"><h2>Personalized Recommendations</h2><ul class="recs">';
  for (const r of d.recommendations) html += '<li>' + esc(r) + '</li>';
  html += '</ul></div>';

  html += '<div class="card"><h2>Post-by-Post Sentiment</h2><div class="posts">';
  for (const p of d.posts) {
    html += '<div class="post"><div>' + esc(p.text) + '</div>'
      + '<div class="meta">Sentiment: <strong>' + esc(p.label) + '</strong> | Time: ' + esc(p.time) + '</div></div>';
  }
  html += '</div></div>';

  document.getElementById('content').innerHTML = html;
  if (d.chart) drawPie(document.getElementById('pie'), d.chart);
}

async function loadDashboard() {
  const res = await fetch('/api/dashboard');
  const body = await res.json();
  if (res.status === 401) return sessionExpired(body.error);
  if (!res.ok) {
    document.getElementById('content').innerHTML =
      '<div class="empty">Failed to load dashboard: ' + esc(body.error) + '</div>';
    return;
  }
  render(body);
  loadSession();
}

loadDashboard();
</script>
</body>
</html>
"##
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_has_placeholder() {
        assert!(LOGIN_HTML.contains("{{login_url}}"));
        assert!(LOGIN_HTML.contains("--accent"));
    }

    #[test]
    fn dashboard_page_uses_api() {
        assert!(DASHBOARD_HTML.contains("/api/dashboard"));
        assert!(DASHBOARD_HTML.contains("/api/session"));
        assert!(DASHBOARD_HTML.contains("No sentiment data to show."));
    }

    #[test]
    fn expiry_timer_is_armed_in_capped_steps() {
        assert!(DASHBOARD_HTML.contains("const MAX_TIMER_MS = 2147483647;"));
        assert!(DASHBOARD_HTML.contains("setTimeout(arm, Math.min(left, MAX_TIMER_MS))"));
        assert!(!DASHBOARD_HTML.contains("s.expires_in_ms);"));
    }
}
