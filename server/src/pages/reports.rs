use super::{limit_label, make_path};
use chrono::NaiveDate;
use common::{QuotaStatus, UsageReportRow};
use leptos::either::Either;
use leptos::prelude::*;
use templates::{Breadcrumb, InfoRow, NavLink, Page};

fn status_label(status: QuotaStatus) -> &'static str {
    match status {
        QuotaStatus::Unlimited => "Ilimitado",
        QuotaStatus::Reached => "Limite Atingido",
        QuotaStatus::NearLimit => "Próximo do Limite",
        QuotaStatus::Available => "Disponível",
    }
}

pub fn render(base: &str, date: NaiveDate, rows: &[UsageReportRow]) -> String {
    let rows = rows.to_vec();
    let empty = rows.is_empty();
    let total: i32 = rows.iter().map(|r| r.used_today).sum();
    let date_str = date.format("%Y-%m-%d").to_string();
    let date_display = date.format("%d/%m/%Y").to_string();

    let content = view! {
        <h2>"Uso Diário de Consultas"</h2>
        {if empty {
            Either::Left(view! {
                <p>"Nenhum usuário cadastrado."</p>
            })
        } else {
            Either::Right(view! {
                <table class="data-table" data-export-name="uso_diario" data-export-date={date_str}>
                    <tr>
                        <th>"Nome"</th>
                        <th>"Usuário"</th>
                        <th>"Telefone"</th>
                        <th>"Consultas hoje"</th>
                        <th>"Limite diário"</th>
                        <th>"Status"</th>
                    </tr>
                    {rows.into_iter().map(|r| {
                        let used = r.used_today.to_string();
                        let limit = limit_label(r.daily_limit);
                        let status = QuotaStatus::of(common::effective_limit(r.daily_limit), r.used_today);
                        let phone = r.phone.unwrap_or_else(|| "-".to_string());
                        view! {
                            <tr>
                                <td>{r.name}</td>
                                <td>{r.username}</td>
                                <td>{phone}</td>
                                <td>{used}</td>
                                <td>{limit}</td>
                                <td class="status">{status_label(status)}</td>
                            </tr>
                        }
                    }).collect::<Vec<_>>()}
                </table>
            })
        }}
    };

    Page {
        title: "Mentor de Vendas - Relatórios".to_string(),
        breadcrumbs: vec![
            Breadcrumb::link("Mentor de Vendas", make_path(base, "")),
            Breadcrumb::current("Relatórios"),
        ],
        nav_links: vec![NavLink::back()],
        info_rows: vec![
            InfoRow::new("Data", &date_display),
            InfoRow::new("Consultas no dia", &total.to_string()),
        ],
        content,
        subpages: vec![],
    }
    .render()
}
