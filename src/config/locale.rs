//! User-facing strings per locale.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Locale used for the widget's own copy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Locale {
    #[default]
    En,
    Es,
    Fr,
    De,
    Pt,
}

impl Locale {
    /// Assistant message substituted for a failed backend reply.
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::En => "Sorry, I'm having trouble responding right now. Please try again in a moment.",
            Self::Es => "Lo siento, tengo problemas para responder en este momento. Inténtalo de nuevo en un momento.",
            Self::Fr => "Désolé, je rencontre des difficultés pour répondre. Veuillez réessayer dans un instant.",
            Self::De => "Entschuldigung, ich kann gerade nicht antworten. Bitte versuche es gleich noch einmal.",
            Self::Pt => "Desculpe, estou com dificuldades para responder agora. Tente novamente em instantes.",
        }
    }

    pub fn input_placeholder(self) -> &'static str {
        match self {
            Self::En => "Type your message...",
            Self::Es => "Escribe tu mensaje...",
            Self::Fr => "Écrivez votre message...",
            Self::De => "Nachricht eingeben...",
            Self::Pt => "Digite sua mensagem...",
        }
    }

    pub fn greeting(self) -> &'static str {
        match self {
            Self::En => "Hi! How can I help you today?",
            Self::Es => "¡Hola! ¿En qué puedo ayudarte hoy?",
            Self::Fr => "Bonjour ! Comment puis-je vous aider ?",
            Self::De => "Hallo! Wie kann ich helfen?",
            Self::Pt => "Olá! Como posso ajudar hoje?",
        }
    }

    pub fn send_label(self) -> &'static str {
        match self {
            Self::En => "Send",
            Self::Es => "Enviar",
            Self::Fr => "Envoyer",
            Self::De => "Senden",
            Self::Pt => "Enviar",
        }
    }

    pub fn close_label(self) -> &'static str {
        match self {
            Self::En => "Close chat",
            Self::Es => "Cerrar chat",
            Self::Fr => "Fermer le chat",
            Self::De => "Chat schließen",
            Self::Pt => "Fechar chat",
        }
    }

    pub fn open_label(self) -> &'static str {
        match self {
            Self::En => "Open chat",
            Self::Es => "Abrir chat",
            Self::Fr => "Ouvrir le chat",
            Self::De => "Chat öffnen",
            Self::Pt => "Abrir chat",
        }
    }
}
