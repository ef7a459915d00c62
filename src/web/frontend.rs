//! Embedded HTML/CSS/JS frontend for the offerdash web dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>offerdash</title>
<style>
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
  --purple: #bc8cff;
  --cyan: #39d2c0;
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

.app { max-width: 1280px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); font-weight: 700; }
header .subtitle { color: var(--text-muted); font-size: 13px; }

nav { display: flex; gap: 4px; margin-bottom: 24px; }
nav button {
  background: none; border: 1px solid transparent; color: var(--text-muted);
  padding: 8px 16px; border-radius: var(--radius); cursor: pointer; font-size: 14px;
}
nav button:hover { color: var(--text); background: var(--surface); }
nav button.active { color: var(--text); background: var(--surface); border-color: var(--border); }

.panel { display: none; }
.panel.active { display: block; }

.card {
  background: var(--surface); border: 1px solid var(--border);
  border-radius: var(--radius); padding: 16px; margin-bottom: 16px;
}
.card h2 { font-size: 15px; margin-bottom: 12px; }

.grid { display: grid; gap: 16px; }
.grid.cols-3 { grid-template-columns: repeat(3, 1fr); }
.grid.cols-2 { grid-template-columns: repeat(2, 1fr); }
.grid.cols-4 { grid-template-columns: repeat(4, 1fr); }

.stat .label { color: var(--text-muted); font-size: 12px; text-transform: uppercase; }
.stat .value { font-size: 26px; font-weight: 600; font-family: var(--mono); }
.stat .trend { font-size: 12px; }
.up { color: var(--green); }
.down { color: var(--red); }

.toolbar { display: flex; gap: 8px; flex-wrap: wrap; align-items: center; margin-bottom: 16px; }
input, select, textarea {
  background: var(--bg); color: var(--text); border: 1px solid var(--border);
  border-radius: 6px; padding: 6px 10px; font-size: 14px; font-family: var(--font);
}
textarea { width: 100%; min-height: 70px; }
button.btn {
  background: var(--accent); color: #0d1117; border: none; border-radius: 6px;
  padding: 7px 14px; cursor: pointer; font-weight: 600;
}
button.btn.secondary { background: var(--surface); color: var(--text); border: 1px solid var(--border); }
button.btn.danger { background: var(--red); }

table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; font-size: 12px; text-transform: uppercase; }
td.num { text-align: right; font-family: var(--mono); }
tr.clickable:hover { background: rgba(88,166,255,0.06); cursor: pointer; }
.empty { color: var(--text-muted); text-align: center; padding: 24px; }

.board { display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px; }
.column { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); min-height: 300px; }
.column.drop { border-color: var(--accent); }
.column h3 { font-size: 14px; padding: 12px; border-bottom: 1px solid var(--border); }
.column h3 small { display: block; color: var(--text-muted); font-weight: 400; font-family: var(--mono); }
.column .cards { padding: 8px; display: flex; flex-direction: column; gap: 8px; }
.offer-card {
  background: var(--bg); border: 1px solid var(--border); border-radius: 6px;
  padding: 10px; cursor: grab;
}
.offer-card img { width: 100%; height: 90px; object-fit: cover; border-radius: 4px; margin-bottom: 6px; }
.offer-card .meta { color: var(--text-muted); font-size: 12px; }

.bars .row { display: flex; align-items: center; gap: 8px; margin: 4px 0; cursor: pointer; }
.bars .row .name { width: 140px; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.bars .row .bar { height: 18px; background: var(--accent); border-radius: 3px; }
.bars .row .bar.neg { background: var(--red); }
.bars .row.selected .name { color: var(--accent); font-weight: 600; }
.bars .row .val { font-family: var(--mono); font-size: 12px; color: var(--text-muted); }
svg.series { width: 100%; height: 220px; }
.legend { font-size: 12px; color: var(--text-muted); }
.legend .rev { color: var(--green); }
.legend .cost { color: var(--red); }

.form-grid { display: grid; grid-template-columns: repeat(2, 1fr); gap: 10px; }
.form-grid label { display: flex; flex-direction: column; gap: 4px; font-size: 12px; color: var(--text-muted); }
.form-grid .full { grid-column: 1 / -1; }

.chat-log { height: 420px; overflow-y: auto; display: flex; flex-direction: column; gap: 8px; margin-bottom: 12px; }
.bubble { max-width: 75%; padding: 10px 12px; border-radius: 10px; white-space: pre-wrap; }
.bubble.user { align-self: flex-end; background: var(--accent); color: #0d1117; }
.bubble.ai { align-self: flex-start; background: var(--bg); border: 1px solid var(--border); }
.chat-input { display: flex; gap: 8px; }
.chat-input input { flex: 1; }

pre.toml { font-family: var(--mono); font-size: 12px; white-space: pre-wrap; color: var(--text-muted); }
.mono { font-family: var(--mono); }

.toast {
  position: fixed; bottom: 24px; right: 24px; background: var(--surface);
  border: 1px solid var(--green); padding: 10px 16px; border-radius: var(--radius);
  opacity: 0; transition: opacity 0.2s; pointer-events: none;
}
.toast.show { opacity: 1; }
.toast.error { border-color: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <div>
      <h1><span class="logo">offerdash</span></h1>
      <div class="subtitle">Biblioteca de ofertas, quadro de escala e análises</div>
    </div>
    <div class="subtitle" id="health"></div>
  </header>

  <nav id="nav">
    <button data-panel="offers" class="active">Ofertas</button>
    <button data-panel="board">Quadro</button>
    <button data-panel="analytics">Análises</button>
    <button data-panel="mentor">Mentor IA</button>
    <button data-panel="tools">Ferramentas</button>
    <button data-panel="config">Configurações</button>
  </nav>

  <!-- Offers -->
  <section class="panel active" id="panel-offers">
    <div class="toolbar">
      <input id="f-search" placeholder="Buscar por nome...">
      <select id="f-platform"><option value="">Todas as plataformas</option></select>
      <select id="f-status">
        <option value="">Todos os status</option>
        <option>Inicio</option><option>Pré escala</option><option>Escalando</option><option>ESCALADISSIMA</option>
      </select>
      <button class="btn" id="btn-new">Nova oferta</button>
      <a class="btn secondary" href="/api/export.csv" style="text-decoration:none;padding:7px 14px;border-radius:6px;border:1px solid var(--border);color:var(--text)">Exportar CSV</a>
      <label class="btn secondary" style="padding:7px 14px;border-radius:6px;border:1px solid var(--border);cursor:pointer">
        Importar CSV <input type="file" id="import-file" accept=".csv,text/csv" style="display:none">
      </label>
    </div>
    <div class="card">
      <table>
        <thead><tr><th>Nome</th><th>Plataforma</th><th>Nicho</th><th>Status</th><th>Custo</th><th>Receita</th><th>Lucro</th><th>ROI</th></tr></thead>
        <tbody id="offers-tbody"></tbody>
      </table>
      <div class="empty" id="offers-empty" style="display:none">Nenhuma oferta encontrada.</div>
    </div>

    <div class="card" id="offer-form-card" style="display:none">
      <h2 id="offer-form-title">Nova oferta</h2>
      <form id="offer-form" class="form-grid">
        <label>Nome<input name="name" required minlength="2"></label>
        <label>Plataforma<input name="platform" list="platforms"></label>
        <label>Nicho<input name="niche"></label>
        <label>Status<select name="scale_status"><option>Inicio</option><option>Pré escala</option><option>Escalando</option><option>ESCALADISSIMA</option></select></label>
        <label>Custo (R$)<input name="cost" type="number" step="0.01" min="0"></label>
        <label>Receita (R$)<input name="revenue" type="number" step="0.01" min="0"></label>
        <label class="full">URL da imagem<input name="image_url" type="url"></label>
        <label>Página de vendas<input name="sales_page_link" type="url"></label>
        <label>Checkout<input name="checkout_link" type="url"></label>
        <label class="full">Upsells (um por linha, até 7)<textarea name="upsell_links"></textarea></label>
        <label>Página de obrigado<input name="thank_you_page_link" type="url"></label>
        <label>Drive<input name="drive_link" type="url"></label>
        <label class="full">Biblioteca de anúncios<input name="ad_library_link" type="url"></label>
        <label class="full">Observações<textarea name="observations"></textarea></label>
        <div class="full toolbar">
          <button class="btn" type="submit">Salvar</button>
          <button class="btn secondary" type="button" id="btn-cancel">Cancelar</button>
          <button class="btn danger" type="button" id="btn-delete" style="display:none">Excluir</button>
        </div>
      </form>
      <datalist id="platforms"><option>Google Ads</option><option>Facebook Ads</option><option>TikTok Ads</option><option>Outra</option></datalist>
    </div>
  </section>

  <!-- Board -->
  <section class="panel" id="panel-board">
    <div class="board" id="board"></div>
  </section>

  <!-- Analytics -->
  <section class="panel" id="panel-analytics">
    <div class="toolbar">
      <label>De <input type="date" id="a-from"></label>
      <label>Até <input type="date" id="a-to"></label>
      <select id="a-platform"><option value="">Todas as plataformas</option></select>
      <select id="a-niche"><option value="">Todos os nichos</option></select>
      <button class="btn secondary" id="a-clear">Limpar filtros</button>
    </div>
    <div class="grid cols-4" style="margin-bottom:16px">
      <div class="card stat"><div class="label">Receita</div><div class="value" id="m-revenue">–</div><div class="trend" id="t-revenue"></div></div>
      <div class="card stat"><div class="label">Custo</div><div class="value" id="m-cost">–</div><div class="trend" id="t-cost"></div></div>
      <div class="card stat"><div class="label">Lucro</div><div class="value" id="m-profit">–</div><div class="trend" id="t-profit"></div></div>
      <div class="card stat"><div class="label">ROI</div><div class="value" id="m-roi">–</div></div>
    </div>
    <div class="card">
      <h2>Desempenho diário <span class="legend"><span class="rev">● Receita</span> <span class="cost">● Custo</span></span></h2>
      <svg class="series" id="series" preserveAspectRatio="none"></svg>
    </div>
    <div class="grid cols-3">
      <div class="card"><h2>Lucro por plataforma</h2><div class="bars" id="c-platform"></div></div>
      <div class="card"><h2>Ofertas por nicho</h2><div class="bars" id="c-niche-count"></div></div>
      <div class="card"><h2>Lucro por nicho</h2><div class="bars" id="c-niche-profit"></div></div>
    </div>
    <div class="card">
      <h2>Top ofertas</h2>
      <table><thead><tr><th>Nome</th><th>Plataforma</th><th>Lucro</th></tr></thead><tbody id="top-tbody"></tbody></table>
    </div>
  </section>

  <!-- Mentor -->
  <section class="panel" id="panel-mentor">
    <div class="card">
      <h2>Mentor IA</h2>
      <div class="chat-log" id="chat-log"></div>
      <form class="chat-input" id="chat-form">
        <input id="chat-text" placeholder="Pergunte sobre funis, ofertas ou escala...">
        <button class="btn" type="submit" id="chat-send">Enviar</button>
      </form>
    </div>
  </section>

  <!-- Tools -->
  <section class="panel" id="panel-tools">
    <div class="grid cols-2">
      <div class="card">
        <h2>Ferramenta Spy</h2>
        <div class="toolbar">
          <input id="spy-url" placeholder="Cole a URL da página de vendas aqui..." style="flex:1">
          <button class="btn" id="spy-go">Espionar</button>
        </div>
        <div id="spy-result"></div>
      </div>
      <div class="card">
        <h2>Calculadora de ROI</h2>
        <div class="toolbar">
          <input id="roi-cost" type="number" step="0.01" placeholder="Custo (R$)">
          <input id="roi-revenue" type="number" step="0.01" placeholder="Receita (R$)">
          <button class="btn" id="roi-go">Calcular</button>
        </div>
        <div id="roi-result" class="mono"></div>
      </div>
    </div>
    <div class="card">
      <h2>Atividade recente</h2>
      <table><thead><tr><th>Quando</th><th>Evento</th><th>Oferta</th><th>Detalhe</th></tr></thead><tbody id="activity-tbody"></tbody></table>
    </div>
  </section>

  <!-- Config -->
  <section class="panel" id="panel-config">
    <div class="card">
      <h2>Alterar configuração</h2>
      <div class="toolbar">
        <input id="cfg-key" placeholder="analytics.default_days" class="mono">
        <input id="cfg-value" placeholder="7" class="mono">
        <button class="btn" id="cfg-save">Salvar</button>
        <button class="btn secondary" id="cfg-reset">Restaurar padrões</button>
      </div>
    </div>
    <div class="card"><h2>Configuração efetiva</h2><pre class="toml" id="cfg-toml"></pre></div>
  </section>
</div>
<div class="toast" id="toast"></div>

<script>
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
let currentPanel = 'offers';
let offers = [];
let editingId = null;
let analyticsFilter = { platform: '', niche: '' };
let chatHistory = [];
let dragId = null;

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body, raw) {
  const opts = { method, headers: {} };
  if (body !== undefined) {
    if (raw) {
      opts.body = body;
    } else {
      opts.headers['Content-Type'] = 'application/json';
      opts.body = JSON.stringify(body);
    }
  }
  const res = await fetch(path, opts);
  const data = await res.json();
  if (!res.ok) throw new Error(data.error || res.statusText);
  return data;
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show' + (isError ? ' error' : '');
  setTimeout(() => el.className = 'toast', 3000);
}

const brl = new Intl.NumberFormat('pt-BR', { style: 'currency', currency: 'BRL' });
function money(n) { return n === null || n === undefined ? '–' : brl.format(n); }
function pct(n) { return (n || 0).toFixed(1) + '%'; }
function esc(s) {
  return String(s ?? '').replace(/[&<>"']/g, c => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c]));
}
function profitOf(o) { return (o.revenue || 0) - (o.cost || 0); }
function roiOf(o) { const c = o.cost || 0; return c > 0 ? profitOf(o) / c * 100 : 0; }
function isoDay(d) { return d.toISOString().slice(0, 10); }
function qs(params) {
  const p = new URLSearchParams();
  Object.entries(params).forEach(([k, v]) => { if (v) p.set(k, v); });
  const s = p.toString();
  return s ? '?' + s : '';
}
function fillSelect(id, values, placeholder) {
  const el = document.getElementById(id);
  const current = el.value;
  el.innerHTML = `<option value="">${placeholder}</option>` +
    values.map(v => `<option${v === current ? ' selected' : ''}>${esc(v)}</option>`).join('');
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------
document.getElementById('nav').addEventListener('click', e => {
  if (e.target.tagName !== 'BUTTON') return;
  const panel = e.target.dataset.panel;
  if (!panel) return;

  document.querySelectorAll('nav button').forEach(b => b.classList.remove('active'));
  e.target.classList.add('active');
  document.querySelectorAll('.panel').forEach(p => p.classList.remove('active'));
  document.getElementById('panel-' + panel).classList.add('active');

  currentPanel = panel;
  loadPanel(panel);
});

async function loadPanel(panel) {
  try {
    switch (panel) {
      case 'offers': return await loadOffers();
      case 'board': return await loadBoard();
      case 'analytics': return await loadAnalytics();
      case 'tools': return await loadActivity();
      case 'config': return await loadConfig();
    }
  } catch (e) {
    toast(e.message, true);
  }
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------
async function loadOffers() {
  const params = {
    search: document.getElementById('f-search').value,
    platform: document.getElementById('f-platform').value,
    status: document.getElementById('f-status').value,
  };
  offers = await api('GET', '/api/offers' + qs(params));
  const all = params.search || params.platform || params.status ? await api('GET', '/api/offers') : offers;
  fillSelect('f-platform', [...new Set(all.map(o => o.platform).filter(Boolean))].sort(), 'Todas as plataformas');

  const tbody = document.getElementById('offers-tbody');
  document.getElementById('offers-empty').style.display = offers.length ? 'none' : 'block';
  tbody.innerHTML = offers.map(o => `
    <tr class="clickable" data-id="${esc(o.id)}">
      <td>${esc(o.name)}</td>
      <td>${esc(o.platform || 'N/A')}</td>
      <td>${esc(o.niche || 'Sem Nicho')}</td>
      <td>${esc(o.scale_status)}</td>
      <td class="num">${money(o.cost)}</td>
      <td class="num">${money(o.revenue)}</td>
      <td class="num ${profitOf(o) < 0 ? 'down' : 'up'}">${money(profitOf(o))}</td>
      <td class="num">${pct(roiOf(o))}</td>
    </tr>`).join('');
}

['f-search', 'f-platform', 'f-status'].forEach(id =>
  document.getElementById(id).addEventListener('input', () => loadPanel('offers')));

document.getElementById('offers-tbody').addEventListener('click', e => {
  const row = e.target.closest('tr');
  if (!row) return;
  const offer = offers.find(o => o.id === row.dataset.id);
  if (offer) openForm(offer);
});

document.getElementById('btn-new').addEventListener('click', () => openForm(null));
document.getElementById('btn-cancel').addEventListener('click', closeForm);

function openForm(offer, prefill) {
  editingId = offer ? offer.id : null;
  const form = document.getElementById('offer-form');
  form.reset();
  document.getElementById('offer-form-title').textContent = offer ? 'Editar oferta' : 'Nova oferta';
  document.getElementById('btn-delete').style.display = offer ? 'inline-block' : 'none';
  const src = offer ? { ...offer, ...offer.links } : (prefill || {});
  for (const el of form.elements) {
    if (!el.name || src[el.name] === undefined || src[el.name] === null) continue;
    el.value = Array.isArray(src[el.name]) ? src[el.name].join('\n') : src[el.name];
  }
  document.getElementById('offer-form-card').style.display = 'block';
  document.getElementById('offer-form-card').scrollIntoView({ behavior: 'smooth' });
}

function closeForm() {
  editingId = null;
  document.getElementById('offer-form-card').style.display = 'none';
}

function formPayload() {
  const f = new FormData(document.getElementById('offer-form'));
  const text = k => (f.get(k) || '').trim();
  const num = k => text(k) === '' ? null : Number(text(k));
  return {
    name: text('name'),
    platform: text('platform'),
    niche: text('niche'),
    scale_status: text('scale_status'),
    cost: num('cost'),
    revenue: num('revenue'),
    image_url: text('image_url'),
    observations: text('observations'),
    links: {
      sales_page_link: text('sales_page_link'),
      checkout_link: text('checkout_link'),
      upsell_links: text('upsell_links').split('\n').map(s => s.trim()).filter(Boolean),
      thank_you_page_link: text('thank_you_page_link'),
      drive_link: text('drive_link'),
      ad_library_link: text('ad_library_link'),
    },
  };
}

document.getElementById('offer-form').addEventListener('submit', async e => {
  e.preventDefault();
  try {
    const payload = formPayload();
    if (editingId) {
      await api('PUT', '/api/offers/' + encodeURIComponent(editingId), payload);
      toast('Oferta atualizada!');
    } else {
      await api('POST', '/api/offers', payload);
      toast('Oferta criada!');
    }
    closeForm();
    loadPanel('offers');
  } catch (err) {
    toast(err.message, true);
  }
});

document.getElementById('btn-delete').addEventListener('click', async () => {
  if (!editingId || !confirm('Excluir esta oferta?')) return;
  try {
    await api('DELETE', '/api/offers/' + encodeURIComponent(editingId));
    toast('Oferta excluída.');
    closeForm();
    loadPanel('offers');
  } catch (err) {
    toast(err.message, true);
  }
});

document.getElementById('import-file').addEventListener('change', async e => {
  const file = e.target.files[0];
  if (!file) return;
  try {
    const report = await api('POST', '/api/import', await file.arrayBuffer(), true);
    toast(`${report.imported} ofertas importadas` + (report.skipped ? `, ${report.skipped} ignoradas` : ''));
    loadPanel('offers');
  } catch (err) {
    toast(err.message, true);
  } finally {
    e.target.value = '';
  }
});

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------
async function loadBoard() {
  const board = await api('GET', '/api/board');
  document.getElementById('board').innerHTML = board.columns.map(col => `
    <div class="column" data-status="${esc(col.status)}">
      <h3>${esc(col.title)} <small>${col.offers.length} · ${money(col.total_profit)}</small></h3>
      <div class="cards">
        ${col.offers.map(o => `
          <div class="offer-card" draggable="true" data-id="${esc(o.id)}">
            ${o.image_url ? `<img src="${esc(o.image_url)}" alt="">` : ''}
            <div>${esc(o.name)}</div>
            <div class="meta">${esc(o.platform || 'N/A')} · ${esc(o.niche || 'Sem Nicho')}</div>
            <div class="meta ${profitOf(o) < 0 ? 'down' : 'up'}">${money(profitOf(o))}</div>
          </div>`).join('')}
      </div>
    </div>`).join('');
}

const boardEl = document.getElementById('board');
boardEl.addEventListener('dragstart', e => {
  const card = e.target.closest('.offer-card');
  if (card) dragId = card.dataset.id;
});
boardEl.addEventListener('dragover', e => {
  const col = e.target.closest('.column');
  if (!col) return;
  e.preventDefault();
  col.classList.add('drop');
});
boardEl.addEventListener('dragleave', e => {
  const col = e.target.closest('.column');
  if (col) col.classList.remove('drop');
});
boardEl.addEventListener('drop', async e => {
  const col = e.target.closest('.column');
  if (!col || !dragId) return;
  e.preventDefault();
  col.classList.remove('drop');
  try {
    const moved = await api('POST', '/api/board/move', { id: dragId, status: col.dataset.status });
    if (moved.result === 'to') toast('Status atualizado!');
  } catch (err) {
    toast(err.message, true);
  }
  dragId = null;
  loadBoard();
});

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------
(function initRange() {
  const to = new Date();
  const from = new Date(Date.now() - 29 * 86400000);
  document.getElementById('a-from').value = isoDay(from);
  document.getElementById('a-to').value = isoDay(to);
})();

['a-from', 'a-to'].forEach(id =>
  document.getElementById(id).addEventListener('change', () => loadPanel('analytics')));
document.getElementById('a-platform').addEventListener('change', e => {
  analyticsFilter.platform = e.target.value;
  loadPanel('analytics');
});
document.getElementById('a-niche').addEventListener('change', e => {
  analyticsFilter.niche = e.target.value;
  loadPanel('analytics');
});
document.getElementById('a-clear').addEventListener('click', () => {
  analyticsFilter = { platform: '', niche: '' };
  loadPanel('analytics');
});

async function loadAnalytics() {
  const data = await api('GET', '/api/analytics' + qs({
    from: document.getElementById('a-from').value,
    to: document.getElementById('a-to').value,
    platform: analyticsFilter.platform,
    niche: analyticsFilter.niche,
  }));

  fillSelect('a-platform', data.profitByPlatformData.map(p => p.platform), 'Todas as plataformas');
  fillSelect('a-niche', data.offersByNicheData.map(n => n.name), 'Todos os nichos');
  document.getElementById('a-platform').value = analyticsFilter.platform;
  document.getElementById('a-niche').value = analyticsFilter.niche;

  const m = data.currentPeriodMetrics;
  document.getElementById('m-revenue').textContent = money(m.revenue);
  document.getElementById('m-cost').textContent = money(m.cost);
  document.getElementById('m-profit').textContent = money(m.profit);
  document.getElementById('m-roi').textContent = pct(m.roi);
  renderTrend('t-revenue', data.trends.revenue, false);
  renderTrend('t-cost', data.trends.cost, true);
  renderTrend('t-profit', data.trends.profit, false);

  renderSeries(data.performanceOverTimeData);
  renderBars('c-platform', data.profitByPlatformData.map(p => [p.platform, p.profit]), money,
    name => { analyticsFilter.platform = analyticsFilter.platform === name ? '' : name; loadPanel('analytics'); },
    analyticsFilter.platform);
  renderBars('c-niche-count', data.offersByNicheData.map(n => [n.name, n.value]), v => v,
    name => { analyticsFilter.niche = analyticsFilter.niche === name ? '' : name; loadPanel('analytics'); },
    analyticsFilter.niche);
  renderBars('c-niche-profit', data.profitByNicheData.map(n => [n.niche, n.profit]), money,
    name => { analyticsFilter.niche = analyticsFilter.niche === name ? '' : name; loadPanel('analytics'); },
    analyticsFilter.niche);

  document.getElementById('top-tbody').innerHTML = data.topOffers.length
    ? data.topOffers.map(o => `<tr><td>${esc(o.name)}</td><td>${esc(o.platform)}</td><td class="num">${money(o.profit)}</td></tr>`).join('')
    : '<tr><td colspan="3" class="empty">Sem dados no período.</td></tr>';
}

function renderTrend(id, value, costLike) {
  const el = document.getElementById(id);
  const good = costLike ? value <= 0 : value >= 0;
  el.className = 'trend ' + (good ? 'up' : 'down');
  el.textContent = (value >= 0 ? '▲ ' : '▼ ') + pct(Math.abs(value)) + ' vs período anterior';
}

function renderBars(id, rows, fmtValue, onClick, selected) {
  const el = document.getElementById(id);
  if (!rows.length) { el.innerHTML = '<div class="empty">Sem dados.</div>'; return; }
  const max = Math.max(...rows.map(r => Math.abs(r[1])), 1);
  el.innerHTML = rows.map(([name, value]) => `
    <div class="row${name === selected ? ' selected' : ''}" data-name="${esc(name)}">
      <span class="name" title="${esc(name)}">${esc(name)}</span>
      <span class="bar${value < 0 ? ' neg' : ''}" style="width:${Math.max(Math.abs(value) / max * 100, 2)}px"></span>
      <span class="val">${fmtValue(value)}</span>
    </div>`).join('');
  el.querySelectorAll('.row').forEach(r => r.addEventListener('click', () => onClick(r.dataset.name)));
}

function renderSeries(points) {
  const svg = document.getElementById('series');
  const w = 1000, h = 220, pad = 24;
  svg.setAttribute('viewBox', `0 0 ${w} ${h}`);
  if (!points.length) { svg.innerHTML = ''; return; }
  const max = Math.max(...points.map(p => Math.max(p.Receita, p.Custo)), 1);
  const x = i => pad + (points.length === 1 ? (w - 2 * pad) / 2 : i * (w - 2 * pad) / (points.length - 1));
  const y = v => h - pad - v / max * (h - 2 * pad);
  const line = key => points.map((p, i) => `${i ? 'L' : 'M'}${x(i).toFixed(1)},${y(p[key]).toFixed(1)}`).join(' ');
  const step = Math.ceil(points.length / 10);
  svg.innerHTML =
    `<path d="${line('Receita')}" fill="none" stroke="#3fb950" stroke-width="2"/>` +
    `<path d="${line('Custo')}" fill="none" stroke="#f85149" stroke-width="2"/>` +
    points.map((p, i) => i % step === 0
      ? `<text x="${x(i)}" y="${h - 4}" fill="#8b949e" font-size="12" text-anchor="middle">${esc(p.date)}</text>`
      : '').join('');
}

// ---------------------------------------------------------------------------
// Mentor chat
// ---------------------------------------------------------------------------
function renderChat() {
  const log = document.getElementById('chat-log');
  log.innerHTML = chatHistory.map(m => `<div class="bubble ${m.sender}">${esc(m.text)}</div>`).join('');
  log.scrollTop = log.scrollHeight;
}

document.getElementById('chat-form').addEventListener('submit', async e => {
  e.preventDefault();
  const input = document.getElementById('chat-text');
  const text = input.value.trim();
  if (!text) return;
  input.value = '';
  chatHistory.push({ sender: 'user', text });
  const reply = { sender: 'ai', text: '' };
  chatHistory.push(reply);
  renderChat();

  const send = document.getElementById('chat-send');
  send.disabled = true;
  try {
    const res = await fetch('/api/chat', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ history: chatHistory.slice(0, -1) }),
    });
    if (!res.ok) {
      const err = await res.json().catch(() => ({}));
      throw new Error(err.error || res.statusText);
    }
    const reader = res.body.getReader();
    const decoder = new TextDecoder();
    while (true) {
      const { done, value } = await reader.read();
      if (done) break;
      reply.text += decoder.decode(value, { stream: true });
      renderChat();
    }
  } catch (err) {
    reply.text = 'Erro: ' + err.message;
    renderChat();
    toast(err.message, true);
  } finally {
    send.disabled = false;
  }
});

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------
document.getElementById('spy-go').addEventListener('click', async () => {
  const url = document.getElementById('spy-url').value.trim();
  if (!url) { toast('Por favor, insira uma URL para espionar.', true); return; }
  const out = document.getElementById('spy-result');
  out.textContent = 'Espionando...';
  try {
    const r = await api('POST', '/api/spy', { url });
    out.innerHTML = `<p><strong>${esc(r.title || '(sem título)')}</strong></p>` +
      (r.imageUrl ? `<img src="${esc(r.imageUrl)}" alt="" style="max-width:100%;margin:8px 0;border-radius:6px">` : '') +
      `<button class="btn" id="spy-use">Criar oferta com estes dados</button>`;
    document.getElementById('spy-use').addEventListener('click', () => {
      document.querySelector('nav button[data-panel="offers"]').click();
      openForm(null, { name: r.title, image_url: r.imageUrl, sales_page_link: /^https?:\/\//.test(url) ? url : 'https://' + url });
    });
  } catch (err) {
    out.textContent = '';
    toast(err.message, true);
  }
});

document.getElementById('roi-go').addEventListener('click', async () => {
  try {
    const r = await api('GET', '/api/roi' + qs({
      cost: document.getElementById('roi-cost').value,
      revenue: document.getElementById('roi-revenue').value,
    }));
    document.getElementById('roi-result').innerHTML =
      `Lucro: <span class="${r.profit < 0 ? 'down' : 'up'}">${money(r.profit)}</span> · ROI: ${pct(r.roi)}`;
  } catch (err) {
    toast(err.message, true);
  }
});

async function loadActivity() {
  const entries = await api('GET', '/api/activity?limit=30');
  document.getElementById('activity-tbody').innerHTML = entries.length
    ? entries.map(a => `<tr><td class="mono">${esc(new Date(a.timestamp).toLocaleString('pt-BR'))}</td><td>${esc(a.kind)}</td><td>${esc(a.offer_name || '')}</td><td>${esc(a.detail || '')}</td></tr>`).join('')
    : '<tr><td colspan="4" class="empty">Nenhuma atividade registrada.</td></tr>';
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------
async function loadConfig() {
  const data = await api('GET', '/api/config');
  document.getElementById('cfg-toml').textContent = data.toml_text;
}

document.getElementById('cfg-save').addEventListener('click', async () => {
  const key = document.getElementById('cfg-key').value.trim();
  const value = document.getElementById('cfg-value').value;
  if (!key) return;
  try {
    const r = await api('PUT', '/api/config', { updates: [{ key, value }] });
    if (r.success) toast('Configuração salva.'); else toast(r.errors.join('; '), true);
    loadConfig();
  } catch (err) {
    toast(err.message, true);
  }
});

document.getElementById('cfg-reset').addEventListener('click', async () => {
  if (!confirm('Restaurar a configuração padrão?')) return;
  try {
    await api('POST', '/api/config/reset');
    toast('Configuração restaurada.');
    loadConfig();
  } catch (err) {
    toast(err.message, true);
  }
});

// ---------------------------------------------------------------------------
// Boot
// ---------------------------------------------------------------------------
api('GET', '/api/health').then(h => {
  document.getElementById('health').textContent =
    `v${h.version} · ${h.offers} ofertas` + (h.chat_configured ? '' : ' · chat sem chave');
}).catch(() => {});
loadPanel(currentPanel);
</script>
</body>
</html>
"##;
