//! Mock security dashboard data
//!
//! Nothing here is measured. The event log, scores and recommendations are
//! fixed tables; the only live inputs are the stored profile and the
//! severity filter.

use serde::{Deserialize, Serialize};

use super::profile::Profile;

const DEFAULT_NAME: &str = "Usuário";
const DEFAULT_ROLE: &str = "Especialista em Segurança";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// One row of the account activity log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecurityEvent {
    pub id: u32,
    pub date: &'static str,
    pub time: &'static str,
    pub event: &'static str,
    pub device: &'static str,
    pub location: &'static str,
    pub ip: &'static str,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecurityMetric {
    pub label: &'static str,
    pub value: u8,
    pub max_value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Incident {
    pub date: &'static str,
    pub text: &'static str,
    pub level: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub description: &'static str,
}

/// Newest first
pub const EVENTS: &[SecurityEvent] = &[
    SecurityEvent {
        id: 1,
        date: "05/05/2025",
        time: "08:32",
        event: "Login bem-sucedido",
        device: "MacBook Pro",
        location: "São Paulo, Brasil",
        ip: "177.92.64.218",
        severity: Severity::Low,
    },
    SecurityEvent {
        id: 2,
        date: "02/05/2025",
        time: "14:15",
        event: "Senha alterada",
        device: "iPhone 15",
        location: "São Paulo, Brasil",
        ip: "177.92.64.218",
        severity: Severity::Low,
    },
    SecurityEvent {
        id: 3,
        date: "30/04/2025",
        time: "19:45",
        event: "Tentativa de login incomum",
        device: "Dispositivo desconhecido",
        location: "Singapura",
        ip: "103.56.115.89",
        severity: Severity::High,
    },
    SecurityEvent {
        id: 4,
        date: "28/04/2025",
        time: "11:03",
        event: "Novo dispositivo autorizado",
        device: "Samsung Galaxy S24",
        location: "São Paulo, Brasil",
        ip: "177.92.64.220",
        severity: Severity::Medium,
    },
    SecurityEvent {
        id: 5,
        date: "22/04/2025",
        time: "16:28",
        event: "Autenticação de dois fatores ativada",
        device: "MacBook Pro",
        location: "São Paulo, Brasil",
        ip: "177.92.64.218",
        severity: Severity::Low,
    },
    SecurityEvent {
        id: 6,
        date: "18/04/2025",
        time: "09:12",
        event: "E-mail de recuperação atualizado",
        device: "MacBook Pro",
        location: "São Paulo, Brasil",
        ip: "177.92.64.218",
        severity: Severity::Medium,
    },
    SecurityEvent {
        id: 7,
        date: "15/04/2025",
        time: "22:56",
        event: "Tentativa de acesso à API",
        device: "Dispositivo desconhecido",
        location: "Kiev, Ucrânia",
        ip: "92.114.64.112",
        severity: Severity::High,
    },
    SecurityEvent {
        id: 8,
        date: "12/04/2025",
        time: "15:30",
        event: "Senha de aplicativo criada",
        device: "MacBook Pro",
        location: "São Paulo, Brasil",
        ip: "177.92.64.218",
        severity: Severity::Low,
    },
    SecurityEvent {
        id: 9,
        date: "10/04/2025",
        time: "10:44",
        event: "Permissões de aplicativo revisadas",
        device: "iPhone 15",
        location: "São Paulo, Brasil",
        ip: "177.92.64.218",
        severity: Severity::Low,
    },
    SecurityEvent {
        id: 10,
        date: "05/04/2025",
        time: "17:22",
        event: "Login após longo período",
        device: "Windows PC",
        location: "Rio de Janeiro, Brasil",
        ip: "201.17.89.72",
        severity: Severity::Medium,
    },
];

/// The first entry is the overall score
pub const METRICS: &[SecurityMetric] = &[
    SecurityMetric {
        label: "Pontuação Geral",
        value: 78,
        max_value: 100,
    },
    SecurityMetric {
        label: "Força da Senha",
        value: 85,
        max_value: 100,
    },
    SecurityMetric {
        label: "Autenticação",
        value: 75,
        max_value: 100,
    },
    SecurityMetric {
        label: "Atividade de Login",
        value: 65,
        max_value: 100,
    },
];

pub const PROTECTED_ACCOUNTS: &[&str] =
    &["Google", "Facebook", "Instagram", "Twitter", "LinkedIn", "Banco"];

pub const INCIDENTS: &[Incident] = &[
    Incident {
        date: "14/04",
        text: "Tentativa de login incomum",
        level: Severity::High,
    },
    Incident {
        date: "10/04",
        text: "E-mail de phishing detectado",
        level: Severity::Medium,
    },
    Incident {
        date: "02/04",
        text: "Senha fraca alterada",
        level: Severity::Low,
    },
];

pub const RECOMMENDATIONS: &[Recommendation] = &[
    Recommendation {
        title: "Habilite 2FA",
        description: "Em todas as suas contas importantes",
    },
    Recommendation {
        title: "Atualize senhas",
        description: "Algumas senhas estão desatualizadas",
    },
    Recommendation {
        title: "Verificar privacidade",
        description: "Configurações de redes sociais",
    },
];

/// Percentage of vulnerabilities shown as resolved
pub const VULNERABILITIES_RESOLVED: u8 = 73;

/// Events per weekday, as percentages of the busiest day
pub const WEEKLY_ACTIVITY: [u8; 7] = [30, 45, 25, 60, 75, 40, 50];

/// Events in the log, optionally only those of one severity
pub fn events(severity: Option<Severity>) -> Vec<SecurityEvent> {
    EVENTS
        .iter()
        .filter(|e| severity.map_or(true, |s| e.severity == s))
        .copied()
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub name: String,
    pub role: String,
    pub score: u8,
    pub vulnerabilities_resolved: u8,
    pub protected_accounts: &'static [&'static str],
    pub incidents: &'static [Incident],
    pub weekly_activity: [u8; 7],
    pub recommendations: &'static [Recommendation],
}

/// Dashboard header and cards for the stored profile, if any
pub fn overview(profile: Option<&Profile>) -> Overview {
    let name = profile
        .and_then(Profile::display_name)
        .unwrap_or(DEFAULT_NAME)
        .to_string();
    let role = profile
        .map(|p| p.role.trim())
        .filter(|role| !role.is_empty())
        .unwrap_or(DEFAULT_ROLE)
        .to_string();

    Overview {
        name,
        role,
        score: METRICS[0].value,
        vulnerabilities_resolved: VULNERABILITIES_RESOLVED,
        protected_accounts: PROTECTED_ACCOUNTS,
        incidents: INCIDENTS,
        weekly_activity: WEEKLY_ACTIVITY,
        recommendations: RECOMMENDATIONS,
    }
}
