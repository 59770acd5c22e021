use leptos::either::Either;
use leptos::prelude::*;

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Status banner shown above a form after it was submitted.
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn to_html(&self) -> String {
        match self {
            Notice::Success(msg) => {
                format!(r#"<p class="notice success">{}</p>"#, html_escape(msg))
            }
            Notice::Error(msg) => format!(r#"<p class="notice error">{}</p>"#, html_escape(msg)),
        }
    }
}

pub fn notice_html(notice: Option<&Notice>) -> String {
    notice.map(Notice::to_html).unwrap_or_default()
}

const COLLAPSE_THRESHOLD: usize = 200;

pub fn collapsible_block(content: &str, css_class: &str) -> String {
    let escaped = html_escape(content);
    if content.len() <= COLLAPSE_THRESHOLD {
        if content.contains('\n') {
            return format!(r#"<pre class="{}">{}</pre>"#, css_class, escaped);
        } else {
            return format!(r#"<div class="{}">{}</div>"#, css_class, escaped);
        }
    }
    let preview: String = content.chars().take(COLLAPSE_THRESHOLD).collect();
    let preview_escaped = html_escape(&preview);
    format!(
        r#"<details class="collapsible"><summary><span class="preview-text {cls}">{preview}...</span> <span class="show-more">ver mais</span><span class="show-less">ver menos</span></summary><div class="collapsible-full {cls}">{full}</div></details>"#,
        cls = css_class,
        preview = preview_escaped,
        full = escaped
    )
}

const STYLE: &str = r#"
body { font-family: monospace; padding: 16px; max-width: 1100px; }
table { width: 100%; border-collapse: collapse; }
th { text-align: left; padding: 6px 8px; border-bottom: 1px solid #ccc; }
td { padding: 6px 8px; border-bottom: 1px solid #eee; vertical-align: top; }
table.data-table th { cursor: pointer; user-select: none; }
table.data-table th.sort-asc:after { content: ' \25B2'; }
table.data-table th.sort-desc:after { content: ' \25BC'; }
pre, .answer { white-space: pre-wrap; }
details.collapsible > summary { cursor: pointer; list-style: none; }
details.collapsible > summary .show-less,
details.collapsible[open] > summary .preview-text,
details.collapsible[open] > summary .show-more { display: none; }
details.collapsible[open] > summary .show-less { display: inline; }
label { display: block; margin: 6px 0; }
textarea { width: 100%; min-height: 6em; font-family: monospace; }
.notice { padding: 6px 8px; border: 1px solid; }
.notice.success { border-color: #2a2; color: #161; }
.notice.error { border-color: #c22; color: #911; }
"#;

/// Column sorting for `table.data-table`, and a CSV download button for
/// tables that carry `data-export-name` (plus `data-export-date` if set).
const SCRIPT: &str = r#"
document.querySelectorAll('table.data-table').forEach(function (table) {
  var header = table.querySelector('tr');
  Array.from(header.children).forEach(function (th, idx) {
    th.addEventListener('click', function () {
      var rows = Array.from(table.querySelectorAll('tr')).slice(1);
      var asc = !th.classList.contains('sort-asc');
      Array.from(header.children).forEach(function (h) { h.classList.remove('sort-asc', 'sort-desc'); });
      th.classList.add(asc ? 'sort-asc' : 'sort-desc');
      rows.sort(function (a, b) {
        var x = a.children[idx].textContent, y = b.children[idx].textContent;
        var d = (isNaN(parseFloat(x)) || isNaN(parseFloat(y))) ? x.localeCompare(y, 'pt-BR') : parseFloat(x) - parseFloat(y);
        return asc ? d : -d;
      });
      rows.forEach(function (r) { table.appendChild(r); });
    });
  });

  var name = table.dataset.exportName;
  if (!name) return;
  var button = document.createElement('button');
  button.textContent = 'Exportar CSV';
  button.addEventListener('click', function () {
    var csv = Array.from(table.querySelectorAll('tr')).map(function (row) {
      return Array.from(row.children).map(function (cell) {
        return '"' + cell.textContent.replace(/"/g, '""') + '"';
      }).join(';');
    }).join('\n');
    var link = document.createElement('a');
    link.href = URL.createObjectURL(new Blob(['\ufeff' + csv], { type: 'text/csv;charset=utf-8' }));
    link.download = name + (table.dataset.exportDate ? '_' + table.dataset.exportDate : '') + '.csv';
    link.click();
    URL.revokeObjectURL(link.href);
  });
  table.before(button);
});
"#;

pub fn page_layout(title: &str, body_html: String) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body_html}\n<script>{SCRIPT}</script>\n</body>\n</html>",
        html_escape(title),
    )
}

pub struct Breadcrumb {
    pub label: String,
    pub href: Option<String>,
}

impl Breadcrumb {
    pub fn link(label: impl ToString, href: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            href: Some(href.to_string()),
        }
    }

    pub fn current(label: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            href: None,
        }
    }
}

pub struct NavLink {
    pub label: String,
    pub href: String,
}

impl NavLink {
    pub fn new(label: impl ToString, href: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            href: href.to_string(),
        }
    }

    pub fn back() -> Self {
        Self {
            label: "Voltar".to_string(),
            href: "javascript:history.back()".to_string(),
        }
    }
}

pub struct InfoRow {
    pub label: String,
    pub value: String,
}

impl InfoRow {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: html_escape(value),
        }
    }
}

/// A linked screen listed under "Páginas".
pub struct Subpage {
    pub label: String,
    pub href: String,
    pub description: String,
}

impl Subpage {
    pub fn new(label: impl ToString, href: impl ToString, description: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            href: href.to_string(),
            description: description.to_string(),
        }
    }
}

pub struct Page<C: IntoView = ()> {
    pub title: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub nav_links: Vec<NavLink>,
    pub info_rows: Vec<InfoRow>,
    pub content: C,
    pub subpages: Vec<Subpage>,
}

impl<C: IntoView> Page<C> {
    pub fn render(self) -> String {
        let Page {
            title,
            breadcrumbs,
            nav_links,
            info_rows,
            content,
            subpages,
        } = self;

        let body = view! {
            {if !breadcrumbs.is_empty() {
                Either::Left(view! {
                    <h1>
                        {breadcrumbs.into_iter().enumerate().map(|(i, crumb)| {
                            let sep = if i > 0 { " / " } else { "" };
                            match crumb.href {
                                Some(href) => Either::Left(view! {
                                    {sep}<a href={href}>{crumb.label}</a>
                                }),
                                None => Either::Right(view! {
                                    {sep}{crumb.label}
                                }),
                            }
                        }).collect::<Vec<_>>()}
                    </h1>
                })
            } else {
                Either::Right(())
            }}

            {if !nav_links.is_empty() {
                Either::Left(view! {
                    <h2>"Navegação"</h2>
                    <table>
                        {nav_links.into_iter().map(|link| {
                            view! { <tr><td><a href={link.href}>{link.label}</a></td></tr> }
                        }).collect::<Vec<_>>()}
                    </table>
                })
            } else {
                Either::Right(())
            }}

            {if !info_rows.is_empty() {
                Either::Left(view! {
                    <h2>"Resumo"</h2>
                    <table>
                        {info_rows.into_iter().map(|row| {
                            view! { <tr><td>{row.label}</td><td inner_html={row.value}></td></tr> }
                        }).collect::<Vec<_>>()}
                    </table>
                })
            } else {
                Either::Right(())
            }}

            {content}

            {if !subpages.is_empty() {
                Either::Left(view! {
                    <h2>"Páginas"</h2>
                    <table>
                        <tr><th>"Página"</th><th>"Descrição"</th></tr>
                        {subpages.into_iter().map(|sp| {
                            view! { <tr><td><a href={sp.href}>{sp.label}</a></td><td>{sp.description}</td></tr> }
                        }).collect::<Vec<_>>()}
                    </table>
                })
            } else {
                Either::Right(())
            }}
        };

        page_layout(&title, body.to_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_special_chars() {
        assert_eq!(
            html_escape("<b>\"a&b\"</b>"),
            "&lt;b&gt;&quot;a&amp;b&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn html_escape_no_special_chars() {
        assert_eq!(html_escape("hello world"), "hello world");
    }

    #[test]
    fn notice_success_and_error_are_escaped() {
        let ok = Notice::Success("Salvo <ok>".to_string()).to_html();
        assert_eq!(ok, r#"<p class="notice success">Salvo &lt;ok&gt;</p>"#);
        let err = Notice::Error("falhou".to_string()).to_html();
        assert!(err.contains(r#"class="notice error""#));
        assert!(err.contains("falhou"));
    }

    #[test]
    fn notice_html_none_is_empty() {
        assert_eq!(notice_html(None), "");
    }

    #[test]
    fn collapsible_block_short_single_line() {
        let result = collapsible_block("short text", "cls");
        assert_eq!(result, r#"<div class="cls">short text</div>"#);
    }

    #[test]
    fn collapsible_block_short_multiline() {
        let result = collapsible_block("line1\nline2", "cls");
        assert_eq!(
            result,
            r#"<pre class="cls">line1
line2</pre>"#
        );
    }

    #[test]
    fn collapsible_block_long_content() {
        let long = "a".repeat(300);
        let result = collapsible_block(&long, "cls");
        assert!(result.contains("ver mais"));
        assert!(result.contains("ver menos"));
        assert!(result.contains("collapsible"));
    }

    #[test]
    fn page_layout_wraps_body() {
        let result = page_layout("Test Title", "<p>body</p>".to_string());
        assert!(result.contains("<title>Test Title</title>"));
        assert!(result.contains("<p>body</p>"));
        assert!(result.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn page_layout_includes_table_script() {
        let result = page_layout("T", String::new());
        assert!(result.contains("table.data-table"));
        assert!(result.contains("Exportar CSV"));
        assert!(result.contains(r#"<html lang="pt-BR">"#));
    }

    #[test]
    fn page_layout_escapes_title() {
        let result = page_layout("<script>", "".to_string());
        assert!(result.contains("<title>&lt;script&gt;</title>"));
    }

    #[test]
    fn page_render_breadcrumbs_only() {
        let html = Page {
            title: "Test".to_string(),
            breadcrumbs: vec![
                Breadcrumb::link("Home", "/"),
                Breadcrumb::current("Current"),
            ],
            nav_links: vec![],
            info_rows: vec![],
            content: (),
            subpages: vec![],
        }
        .render();
        assert!(html.contains("<h1>"));
        assert!(html.contains(r#"<a href="/">"#));
        assert!(html.contains("Home"));
        assert!(html.contains(" / "));
        assert!(html.contains("Current"));
        assert!(html.contains("</h1>"));
    }

    #[test]
    fn page_render_nav_links() {
        let html = Page {
            title: "Test".to_string(),
            breadcrumbs: vec![],
            nav_links: vec![NavLink::new("Sair", "/logout"), NavLink::back()],
            info_rows: vec![],
            content: (),
            subpages: vec![],
        }
        .render();
        assert!(html.contains("<h2>Navegação</h2>"));
        assert!(html.contains(r#"<a href="/logout">"#));
        assert!(html.contains("Sair"));
        assert!(html.contains(r#"<a href="javascript:history.back()">"#));
        assert!(html.contains("Voltar"));
    }

    #[test]
    fn page_render_info_rows_escaped() {
        let html = Page {
            title: "Test".to_string(),
            breadcrumbs: vec![],
            nav_links: vec![],
            info_rows: vec![InfoRow::new("Key", "<value>")],
            content: (),
            subpages: vec![],
        }
        .render();
        assert!(html.contains("<h2>Resumo</h2>"));
        assert!(html.contains("Key"));
        assert!(html.contains("&lt;value&gt;"));
        assert!(!html.contains("<value>"));
    }

    #[test]
    fn page_render_content_view() {
        let html = Page {
            title: "Test".to_string(),
            breadcrumbs: vec![],
            nav_links: vec![],
            info_rows: vec![],
            content: view! { <form><input type="text" name="x"/></form> },
            subpages: vec![],
        }
        .render();
        assert!(html.contains("<form>"));
        assert!(html.contains(r#"name="x""#));
    }

    #[test]
    fn page_render_subpages() {
        let html = Page {
            title: "Test".to_string(),
            breadcrumbs: vec![],
            nav_links: vec![],
            info_rows: vec![],
            content: (),
            subpages: vec![Subpage::new("Usuários", "/admin/users", "Cadastro e limites")],
        }
        .render();
        assert!(html.contains("<h2>Páginas</h2>"));
        assert!(html.contains("Página"));
        assert!(html.contains("Descrição"));
        assert!(html.contains(r#"<a href="/admin/users">"#));
        assert!(html.contains("Usuários"));
        assert!(html.contains("Cadastro e limites"));
    }

    #[test]
    fn page_render_empty_sections_omitted() {
        let html = Page {
            title: "Test".to_string(),
            breadcrumbs: vec![],
            nav_links: vec![],
            info_rows: vec![],
            content: (),
            subpages: vec![],
        }
        .render();
        assert!(!html.contains("<h1>"));
        assert!(!html.contains("Navegação"));
        assert!(!html.contains("Resumo"));
        assert!(!html.contains("Páginas"));
    }

    #[test]
    fn page_render_full() {
        let html = Page {
            title: "Mentor de Vendas".to_string(),
            breadcrumbs: vec![Breadcrumb::link("Home", "/"), Breadcrumb::current("Detail")],
            nav_links: vec![NavLink::back()],
            info_rows: vec![InfoRow::new("Consultas hoje", "3 / 5")],
            content: view! { <p>"content"</p> },
            subpages: vec![Subpage::new("Relatórios", "/admin/reports", "Uso do dia")],
        }
        .render();
        assert!(html.contains("<title>Mentor de Vendas</title>"));
        assert!(html.contains("<h1>"));
        assert!(html.contains("Navegação"));
        assert!(html.contains("Resumo"));
        assert!(html.contains("<p>"));
        assert!(html.contains("content"));
        assert!(html.contains("Páginas"));
    }
}
