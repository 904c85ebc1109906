//! Display rows for the monitoring table

use serde::Serialize;

use crate::monitor::{MonitoredClient, TerminalStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Terminal,
    /// Placeholder for a client with no terminals
    NoTerminals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub kind: RowKind,
    pub city: String,
    pub client_name: String,
    pub client_code: String,
    pub ip_vpn: Option<String>,
    pub status: Option<TerminalStatus>,
    pub last_update: Option<String>,
    pub has_problems: bool,
}

/// Monitoring table split into problem rows and the collapsible ok section.
///
/// Problem rows always come first; inside each section rows keep the order
/// the server sent them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorBoard {
    pub problems: Vec<DisplayRow>,
    pub healthy: Vec<DisplayRow>,
    pub total_terminals: usize,
    pub terminals_with_problems: usize,
    pub clients_without_terminals: usize,
}

impl MonitorBoard {
    pub fn build(clients: &[MonitoredClient]) -> Self {
        let mut board = MonitorBoard::default();

        for client in clients {
            if client.terminals.is_empty() {
                board.clients_without_terminals += 1;
                board.healthy.push(DisplayRow {
                    kind: RowKind::NoTerminals,
                    city: client.city.clone(),
                    client_name: client.name.clone(),
                    client_code: client.code.clone(),
                    ip_vpn: None,
                    status: None,
                    last_update: None,
                    has_problems: false,
                });
                continue;
            }

            for terminal in &client.terminals {
                let has_problems = terminal.status.is_problem();
                board.total_terminals += 1;

                let row = DisplayRow {
                    kind: RowKind::Terminal,
                    city: client.city.clone(),
                    client_name: client.name.clone(),
                    client_code: client.code.clone(),
                    ip_vpn: Some(terminal.ip_vpn.clone()),
                    status: Some(terminal.status.clone()),
                    last_update: terminal.last_replica_update.clone(),
                    has_problems,
                };

                if has_problems {
                    board.terminals_with_problems += 1;
                    board.problems.push(row);
                } else {
                    board.healthy.push(row);
                }
            }
        }

        board
    }

    /// All rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &DisplayRow> {
        self.problems.iter().chain(self.healthy.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty() && self.healthy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::Terminal;

    fn terminal(ip: &str, status: &str) -> Terminal {
        Terminal {
            ip_vpn: ip.to_string(),
            status: TerminalStatus::normalize(status),
            last_replica_update: None,
        }
    }

    fn client(code: &str, terminals: Vec<Terminal>) -> MonitoredClient {
        MonitoredClient {
            pk: code.to_string(),
            code: code.to_string(),
            name: format!("Client {}", code),
            city: "Temuco".to_string(),
            listener_port: None,
            terminals,
        }
    }

    #[test]
    fn test_problems_first_source_order_kept() {
        let clients = vec![
            client(
                "C",
                vec![
                    terminal("10.0.0.1", "OK"),
                    terminal("10.0.0.2", "Error grave"),
                    terminal("10.0.0.3", "Sin Conexi&oacute;n"),
                ],
            ),
            client("D", vec![]),
        ];

        let board = MonitorBoard::build(&clients);
        let order: Vec<_> = board
            .rows()
            .map(|r| (r.client_code.as_str(), r.ip_vpn.as_deref(), r.kind))
            .collect();

        assert_eq!(
            order,
            vec![
                ("C", Some("10.0.0.2"), RowKind::Terminal),
                ("C", Some("10.0.0.3"), RowKind::Terminal),
                ("C", Some("10.0.0.1"), RowKind::Terminal),
                ("D", None, RowKind::NoTerminals),
            ]
        );
        assert_eq!(board.problems.len(), 2);
        assert_eq!(board.healthy.len(), 2);
        assert_eq!(board.total_terminals, 3);
        assert_eq!(board.terminals_with_problems, 2);
        assert_eq!(board.clients_without_terminals, 1);
    }

    #[test]
    fn test_empty_board() {
        assert!(MonitorBoard::build(&[]).is_empty());
    }
}
