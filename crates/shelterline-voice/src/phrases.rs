//! Spoken texts per caller language.
//!
//! The session picks the phrase; the speech pipeline turns it into audio.
//! Texts stay short and ask one thing at a time — callers may be in
//! distress or on limited phone time.

use shelterline_core::{ConfirmationCode, Language};

pub fn greeting(language: Language) -> &'static str {
    match language {
        Language::English => {
            "Hello, you've reached the men's shelter. I can help with a bed for tonight, \
             chapel services, volunteering, or donations. How can I help you?"
        }
        Language::Spanish => {
            "Hola, ha llamado al albergue para hombres. Puedo ayudarle con una cama para esta \
             noche, servicios de capilla, voluntariado o donaciones. ¿En qué puedo ayudarle?"
        }
        Language::Portuguese => {
            "Olá, você ligou para o abrigo masculino. Posso ajudar com um leito para esta \
             noite, cultos na capela, voluntariado ou doações. Como posso ajudar?"
        }
        Language::French => {
            "Bonjour, vous avez joint le refuge pour hommes. Je peux vous aider pour un lit ce \
             soir, les services de chapelle, le bénévolat ou les dons. Comment puis-je vous aider ?"
        }
    }
}

/// Crisis hotline response. Delivered immediately on a crisis phrase,
/// before anything else.
pub fn crisis_hotline(language: Language) -> &'static str {
    match language {
        Language::English => {
            "I hear you're going through something serious. Your safety matters most right now. \
             If you're in immediate danger, please call 911. You can also call or text 988, the \
             Suicide and Crisis Lifeline, any time. Please stay on the line if you'd like to talk."
        }
        Language::Spanish => {
            "Escucho que está pasando por algo muy serio. Su seguridad es lo más importante. \
             Si está en peligro inmediato, llame al 911. También puede llamar o enviar un mensaje \
             al 988, la Línea de Prevención del Suicidio y Crisis, a cualquier hora."
        }
        Language::Portuguese => {
            "Percebo que você está passando por algo muito sério. Sua segurança é o mais \
             importante agora. Se estiver em perigo imediato, ligue para o 911. Você também pode \
             ligar para o 988, a linha de prevenção ao suicídio, a qualquer hora."
        }
        Language::French => {
            "J'entends que vous traversez quelque chose de grave. Votre sécurité compte avant \
             tout. En cas de danger immédiat, appelez le 911. Vous pouvez aussi appeler le 988, \
             la ligne de prévention du suicide, à tout moment."
        }
    }
}

pub fn availability(language: Language, available: u16, total: u16) -> String {
    match language {
        Language::English => format!(
            "Good news, we have {available} beds open out of {total}. Would you like me to \
             reserve one? The hold lasts three hours."
        ),
        Language::Spanish => format!(
            "Buenas noticias, tenemos {available} camas libres de {total}. ¿Quiere que le \
             reserve una? La reserva se mantiene por tres horas."
        ),
        Language::Portuguese => format!(
            "Boa notícia, temos {available} leitos livres de {total}. Quer que eu reserve um? \
             A reserva vale por três horas."
        ),
        Language::French => format!(
            "Bonne nouvelle, nous avons {available} lits libres sur {total}. Voulez-vous que \
             j'en réserve un ? La réservation est valable trois heures."
        ),
    }
}

pub fn no_capacity(language: Language) -> &'static str {
    match language {
        Language::English => {
            "I'm sorry, all of our beds are taken right now. Beds sometimes open up when a hold \
             expires, so please try again in a few hours."
        }
        Language::Spanish => {
            "Lo siento, todas nuestras camas están ocupadas en este momento. A veces se liberan \
             camas cuando vence una reserva; por favor intente de nuevo en unas horas."
        }
        Language::Portuguese => {
            "Sinto muito, todos os nossos leitos estão ocupados agora. Às vezes um leito é \
             liberado quando uma reserva expira; tente novamente em algumas horas."
        }
        Language::French => {
            "Je suis désolé, tous nos lits sont pris pour le moment. Des lits se libèrent \
             parfois quand une réservation expire ; réessayez dans quelques heures."
        }
    }
}

pub fn ask_name(language: Language) -> &'static str {
    match language {
        Language::English => "Of course. First, may I have your first name?",
        Language::Spanish => "Por supuesto. Primero, ¿me puede decir su nombre?",
        Language::Portuguese => "Claro. Primeiro, pode me dizer seu nome?",
        Language::French => "Bien sûr. D'abord, puis-je avoir votre prénom ?",
    }
}

pub fn ask_situation(language: Language) -> &'static str {
    match language {
        Language::English => {
            "Thank you. Can you tell me briefly about your current situation?"
        }
        Language::Spanish => {
            "Gracias. ¿Puede contarme brevemente su situación actual?"
        }
        Language::Portuguese => {
            "Obrigado. Pode me contar brevemente sua situação atual?"
        }
        Language::French => {
            "Merci. Pouvez-vous me décrire brièvement votre situation actuelle ?"
        }
    }
}

pub fn ask_needs(language: Language) -> &'static str {
    match language {
        Language::English => {
            "Do you have any immediate needs I should note, like medical care or recovery \
             support? You can say none."
        }
        Language::Spanish => {
            "¿Tiene alguna necesidad inmediata que deba anotar, como atención médica o apoyo de \
             recuperación? Puede decir ninguna."
        }
        Language::Portuguese => {
            "Você tem alguma necessidade imediata que eu deva anotar, como cuidados médicos ou \
             apoio à recuperação? Pode dizer nenhuma."
        }
        Language::French => {
            "Avez-vous des besoins immédiats à noter, comme des soins médicaux ou un soutien au \
             rétablissement ? Vous pouvez dire aucun."
        }
    }
}

pub fn confirm_reservation(language: Language, name: &str) -> String {
    match language {
        Language::English => {
            format!("Thank you, {name}. Shall I reserve a bed for you tonight? Please say yes or no.")
        }
        Language::Spanish => {
            format!("Gracias, {name}. ¿Le reservo una cama para esta noche? Diga sí o no, por favor.")
        }
        Language::Portuguese => {
            format!("Obrigado, {name}. Reservo um leito para você esta noite? Diga sim ou não, por favor.")
        }
        Language::French => {
            format!("Merci, {name}. Je vous réserve un lit pour ce soir ? Dites oui ou non, s'il vous plaît.")
        }
    }
}

pub fn reservation_confirmed(language: Language, code: &ConfirmationCode, bed: u16) -> String {
    match language {
        Language::English => format!(
            "Done. I've reserved bed {bed} for you. Your confirmation code is {code}. Let me \
             repeat that: {code}. Please arrive within three hours and give this code to the \
             front desk. Check-in is between 5 and 7 PM."
        ),
        Language::Spanish => format!(
            "Listo. Le he reservado la cama {bed}. Su código de confirmación es {code}. Lo \
             repito: {code}. Por favor llegue dentro de tres horas y entregue este código en la \
             recepción. El registro es de 5 a 7 de la tarde."
        ),
        Language::Portuguese => format!(
            "Pronto. Reservei o leito {bed} para você. Seu código de confirmação é {code}. \
             Repetindo: {code}. Chegue dentro de três horas e entregue este código na recepção. \
             O check-in é das 17h às 19h."
        ),
        Language::French => format!(
            "C'est fait. Je vous ai réservé le lit {bed}. Votre code de confirmation est {code}. \
             Je répète : {code}. Merci d'arriver dans les trois heures et de donner ce code à \
             l'accueil. L'enregistrement est de 17 h à 19 h."
        ),
    }
}

pub fn already_reserved(language: Language, code: &ConfirmationCode, bed: u16) -> String {
    match language {
        Language::English => format!(
            "You already have bed {bed} reserved on this call. Your confirmation code is {code}."
        ),
        Language::Spanish => format!(
            "Ya tiene reservada la cama {bed} en esta llamada. Su código de confirmación es {code}."
        ),
        Language::Portuguese => format!(
            "Você já tem o leito {bed} reservado nesta ligação. Seu código de confirmação é {code}."
        ),
        Language::French => format!(
            "Vous avez déjà le lit {bed} réservé pour cet appel. Votre code de confirmation est {code}."
        ),
    }
}

pub fn donation_info(language: Language) -> &'static str {
    match language {
        Language::English => {
            "Thank you for thinking of us. Donations are received at the front desk every day \
             between 9 AM and 5 PM at 611 Reily Street, and monetary gifts can be made through \
             our website. Is there anything else I can help with?"
        }
        Language::Spanish => {
            "Gracias por pensar en nosotros. Las donaciones se reciben en la recepción todos \
             los días de 9 a 17 horas en 611 Reily Street, y los donativos monetarios pueden \
             hacerse a través de nuestro sitio web. ¿Puedo ayudarle en algo más?"
        }
        Language::Portuguese => {
            "Obrigado por pensar em nós. As doações são recebidas na recepção todos os dias das \
             9h às 17h, em 611 Reily Street, e doações em dinheiro podem ser feitas pelo nosso \
             site. Posso ajudar em mais alguma coisa?"
        }
        Language::French => {
            "Merci de penser à nous. Les dons sont reçus à l'accueil tous les jours de 9 h à \
             17 h au 611 Reily Street, et les dons monétaires peuvent être faits sur notre site. \
             Puis-je vous aider pour autre chose ?"
        }
    }
}

pub fn degraded(language: Language) -> &'static str {
    match language {
        Language::English => {
            "I'm having trouble completing that right now. Please come to the shelter between \
             5 and 7 PM and our staff will do their best to help you."
        }
        Language::Spanish => {
            "Estoy teniendo problemas para completar eso ahora. Por favor venga al albergue \
             entre las 5 y las 7 de la tarde y nuestro personal hará todo lo posible por ayudarle."
        }
        Language::Portuguese => {
            "Estou com dificuldade para concluir isso agora. Por favor, venha ao abrigo entre \
             17h e 19h e nossa equipe fará o possível para ajudar."
        }
        Language::French => {
            "J'ai du mal à terminer cela pour le moment. Venez au refuge entre 17 h et 19 h et \
             notre équipe fera de son mieux pour vous aider."
        }
    }
}

pub fn farewell(language: Language) -> &'static str {
    match language {
        Language::English => "Take care. Goodbye.",
        Language::Spanish => "Cuídese. Adiós.",
        Language::Portuguese => "Se cuide. Tchau.",
        Language::French => "Prenez soin de vous. Au revoir.",
    }
}

pub fn fallback(language: Language) -> &'static str {
    match language {
        Language::English => {
            "I can help with a bed for tonight, chapel services, volunteering, or donations. \
             What would you like?"
        }
        Language::Spanish => {
            "Puedo ayudarle con una cama para esta noche, servicios de capilla, voluntariado o \
             donaciones. ¿Qué desea?"
        }
        Language::Portuguese => {
            "Posso ajudar com um leito para esta noite, cultos na capela, voluntariado ou \
             doações. O que você deseja?"
        }
        Language::French => {
            "Je peux vous aider pour un lit ce soir, les services de chapelle, le bénévolat ou \
             les dons. Que souhaitez-vous ?"
        }
    }
}

// Chapel and volunteer callers are visiting groups and local residents;
// these flows run in English like the staff they'll coordinate with.

pub fn ask_chapel_date() -> &'static str {
    "Happy to schedule a chapel service. What date would you like? Please say it as \
     year, month, day — for example 2026-03-04. Services run on weekdays only."
}

pub fn ask_chapel_time(slots: &[String]) -> String {
    format!(
        "What start time would you like? Available slots are {}.",
        slots.join(", ")
    )
}

pub fn ask_chapel_group() -> &'static str {
    "What is the name of your group or congregation?"
}

pub fn ask_chapel_contact_name() -> &'static str {
    "Who should we list as the contact person?"
}

pub fn ask_chapel_contact_phone() -> &'static str {
    "And what phone number can we reach them at?"
}

pub fn chapel_confirmed(date: &str, slot: &str) -> String {
    format!(
        "You're scheduled: a chapel service on {date} at {slot}. Our chaplain will call your \
         contact to confirm details. Thank you for serving with us."
    )
}

pub fn chapel_weekend() -> &'static str {
    "I'm sorry, chapel services run on weekdays only. Could you give me a Monday-to-Friday date?"
}

pub fn chapel_invalid_time(slots: &[String]) -> String {
    format!(
        "That time isn't one of our slots. Available start times are {}. Which would you like?",
        slots.join(", ")
    )
}

pub fn chapel_slot_taken() -> &'static str {
    "That slot is already booked. Would you like to try a different date or time?"
}

pub fn chapel_bad_date() -> &'static str {
    "I didn't catch that date. Please say it as year, month, day — for example 2026-03-04."
}

pub fn ask_volunteer_name() -> &'static str {
    "Wonderful, we always welcome volunteers. May I have your full name?"
}

pub fn ask_volunteer_phone() -> &'static str {
    "Thank you. What phone number is best to reach you?"
}

pub fn ask_volunteer_availability() -> &'static str {
    "When are you generally available? For example weekday evenings, or weekends."
}

pub fn ask_volunteer_interests() -> &'static str {
    "What kind of service interests you? For example the kitchen, intake, or chapel."
}

pub fn volunteer_confirmed(name: &str) -> String {
    format!(
        "Thank you, {name}. You're registered as a volunteer. Our coordinator will call you \
         within a few days to complete screening and scheduling."
    )
}

/// Explicit farewell phrases, any of which ends the call from any state.
/// Single words are matched on word boundaries so "maybe" never hangs up
/// a call.
pub fn is_farewell(utterance_lower: &str) -> bool {
    const PHRASES: &[&str] = &[
        "that's all", "hang up", "hasta luego", "até logo", "au revoir", "c'est tout",
    ];
    if PHRASES.iter().any(|p| utterance_lower.contains(p)) {
        return true;
    }
    const WORDS: &[&str] = &["goodbye", "bye", "adiós", "adios", "tchau"];
    words(utterance_lower).any(|w| WORDS.contains(&w))
}

fn words(utterance_lower: &str) -> impl Iterator<Item = &str> {
    utterance_lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
}

/// Affirmative answers for confirmation prompts. Matched on whole words so
/// "inside" never reads as "sí".
pub fn is_yes(utterance_lower: &str) -> bool {
    const YES: &[&str] = &["yes", "yeah", "yep", "sure", "sí", "si", "claro", "sim", "oui"];
    words(utterance_lower).any(|w| YES.contains(&w))
}

/// Negative answers for confirmation prompts.
pub fn is_no(utterance_lower: &str) -> bool {
    const NO: &[&str] = &["no", "nope", "não", "nao", "non"];
    words(utterance_lower).any(|w| NO.contains(&w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farewell_needs_a_real_farewell_word() {
        assert!(is_farewell("okay goodbye"));
        assert!(is_farewell("that's all, thanks"));
        assert!(is_farewell("adiós"));
        assert!(!is_farewell("maybe tomorrow"));
        assert!(!is_farewell("i need a bed"));
    }

    #[test]
    fn yes_and_no_match_whole_words_only() {
        assert!(is_yes("yes please"));
        assert!(is_yes("sí, claro"));
        assert!(!is_yes("inside the building"));
        assert!(is_no("no thanks"));
        assert!(!is_no("i know"));
    }
}
