//! Fixed reply content
//!
//! Every reply the assistant produces is one of these strings, either taken
//! verbatim from a table or from one of the fixed templates.

use crate::conversation::Category;

/// A keyword group and the category it selects
#[derive(Debug, Clone, Copy)]
pub struct ResponsePattern {
    pub keywords: &'static [&'static str],
    pub category: Category,
}

/// Ordered pattern list. Earlier entries win.
pub const PATTERNS: &[ResponsePattern] = &[
    ResponsePattern {
        keywords: &["senha", "password", "segura", "forte"],
        category: Category::Tip,
    },
    ResponsePattern {
        keywords: &["hacker", "invasão", "ataque"],
        category: Category::Insight,
    },
    ResponsePattern {
        keywords: &["dica", "conselho", "ajuda", "sugestão"],
        category: Category::Tip,
    },
    ResponsePattern {
        keywords: &["phishing", "email", "golpe", "fraude"],
        category: Category::Insight,
    },
    ResponsePattern {
        keywords: &["virus", "malware", "proteção"],
        category: Category::Tip,
    },
    ResponsePattern {
        keywords: &["privacidade", "dados", "informação"],
        category: Category::Insight,
    },
];

pub const INSIGHTS: &[&str] = &[
    "Suas senhas devem ter pelo menos 12 caracteres e incluir letras maiúsculas, minúsculas, números e símbolos.",
    "Habilite a autenticação de dois fatores em todas as suas contas importantes para uma camada adicional de segurança.",
    "Verifique regularmente as permissões dos aplicativos em seus dispositivos e revogue acesso desnecessário.",
    "Use um gerenciador de senhas para criar e armazenar senhas fortes e únicas para cada conta.",
    "Mantenha seu software e sistemas operacionais atualizados para proteção contra vulnerabilidades conhecidas.",
    "Cuidado com e-mails de phishing. Verifique sempre o remetente e não clique em links suspeitos.",
];

pub const TIPS: &[&str] = &[
    "Evite usar redes Wi-Fi públicas para acessar informações sensíveis ou fazer transações financeiras.",
    "Faça backup regular dos seus dados importantes em dispositivos offline ou serviços de nuvem criptografados.",
    "Use VPN ao navegar em redes públicas para proteger sua privacidade e dados.",
    "Verifique regularmente seus extratos bancários e de cartão de crédito para identificar transações suspeitas.",
    "Não compartilhe informações pessoais ou financeiras em resposta a e-mails, chamadas ou mensagens não solicitadas.",
    "Criptografe seus dispositivos para proteger seus dados caso eles sejam perdidos ou roubados.",
    "Desative Bluetooth e Wi-Fi quando não estiver usando para prevenir acesso não autorizado.",
    "Utilize bloqueadores de anúncios e extensões de privacidade em seus navegadores.",
    "Revise as configurações de privacidade em suas redes sociais regularmente.",
    "Use senhas diferentes para contas diferentes, principalmente para emails e bancos.",
    "Configure alertas de login para ser notificado quando alguém acessar suas contas.",
    "Baixe aplicativos apenas de lojas oficiais como Google Play e App Store.",
    "Desconfie de mensagens ou e-mails que criam senso de urgência ou pedidos incomuns.",
    "Ative o bloqueio automático de tela em seus dispositivos em caso de inatividade.",
    "Proteja seus documentos físicos com informações sensíveis em locais seguros.",
    "Use cartões virtuais ou temporários para compras online quando possível.",
    "Verifique se o site que você está visitando usa HTTPS (cadeado no navegador).",
    "Mantenha um software antivírus atualizado em todos os seus dispositivos.",
    "Desinfete seus dispositivos regularmente com softwares de limpeza confiáveis.",
    "Criptografe seus emails importantes com serviços de criptografia ponta a ponta.",
    "Utilize ferramentas de monitoramento dark web para detectar vazamentos das suas credenciais.",
    "Não deixe suas contas de redes sociais públicas se não for necessário.",
    "Evite clicar em anúncios ou pop-ups suspeitos durante navegação.",
    "Utilize autenticação biométrica quando disponível em seus dispositivos e aplicativos.",
    "Desative o rastreamento de localização em aplicativos que não precisam dessa informação.",
];

/// Reply for input that matches no pattern
pub const FALLBACK: &str = "Posso ajudar com questões de segurança digital. Pergunte-me sobre senhas, proteção contra hackers, privacidade de dados ou outras preocupações de segurança!";

pub const EMERGENCY_ACK: &str = "⚠️ CONTATO DE EMERGÊNCIA ATIVADO ⚠️\n\nUm especialista da equipe Aegis foi notificado e entrará em contato com você nos próximos instantes. Enquanto aguarda, você pode descrever brevemente a situação de emergência para que possamos encaminhar ao especialista correto.";

pub const OPENING_QUESTION: &str = "Como posso ajudar você com sua segurança digital hoje?";

/// Banner strings for the special action buttons
pub mod actions {
    pub const TIPS: &str = "Acessando dicas úteis de segurança para você! Confira nossa página completa de dicas de cibersegurança.";

    pub const INSIGHTS: &str = "Novos insights de segurança estão disponíveis para você agora!";

    pub const EMERGENCY: &str = "Alerta de emergência enviado! Um especialista da equipe Aegis entrará em contato com você em breve. Por favor, mantenha-se conectado.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_lowercase() {
        for pattern in PATTERNS {
            for keyword in pattern.keywords {
                assert_eq!(*keyword, keyword.to_lowercase());
            }
        }
    }

    #[test]
    fn test_patterns_only_select_insight_or_tip() {
        assert!(PATTERNS
            .iter()
            .all(|p| matches!(p.category, Category::Insight | Category::Tip)));
    }

    #[test]
    fn test_tables_are_populated() {
        assert!(!INSIGHTS.is_empty());
        assert!(!TIPS.is_empty());
        assert!(INSIGHTS.iter().chain(TIPS).all(|s| !s.is_empty()));
    }
}
