//! Localized console messages (de/en/es)
//!
//! The catalog is an explicit value carried in the application, not global
//! state. Console-facing status lines come from here; tracing carries the
//! diagnostic channel in English.

use std::fmt;

/// Supported console languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    De,
    En,
    Es,
}

impl Language {
    /// Parse a language code (de, en, es), case-insensitively
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "de" => Some(Self::De),
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn human_name(&self) -> &'static str {
        match self {
            Self::De => "Deutsch",
            Self::En => "English",
            Self::Es => "Español",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fixed message catalog for one language
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    lang: Language,
}

impl Catalog {
    pub fn new(lang: Language) -> Self {
        Self { lang }
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    pub fn app_start(&self) -> &'static str {
        match self.lang {
            Language::De => "[GhostVenom] Starte Sicherheitstool...",
            Language::En => "[GhostVenom] Starting security tool...",
            Language::Es => "[GhostVenom] Iniciando herramienta de seguridad...",
        }
    }

    pub fn label_target(&self) -> &'static str {
        match self.lang {
            Language::De => "Ziel-IP",
            Language::En => "Target IP",
            Language::Es => "IP de destino",
        }
    }

    pub fn label_scan_args(&self) -> &'static str {
        match self.lang {
            Language::De => "Nmap-Parameter",
            Language::En => "Nmap params",
            Language::Es => "Parámetros de Nmap",
        }
    }

    pub fn scan_start(&self) -> &'static str {
        match self.lang {
            Language::De => "Starte Nmap-Scan...",
            Language::En => "Starting Nmap scan...",
            Language::Es => "Iniciando escaneo Nmap...",
        }
    }

    pub fn scan_preview(&self) -> &'static str {
        match self.lang {
            Language::De => "Nmap-Output (erste Zeilen):",
            Language::En => "Nmap output (first lines):",
            Language::Es => "Salida de Nmap (primeras líneas):",
        }
    }

    pub fn scan_no_result(&self) -> &'static str {
        match self.lang {
            Language::De => "Kein Scan-Ergebnis erhalten.",
            Language::En => "No scan result received.",
            Language::Es => "No se recibió resultado del escaneo.",
        }
    }

    pub fn analysis_start(&self) -> &'static str {
        match self.lang {
            Language::De => "Starte GPT-Auswertung...",
            Language::En => "Starting GPT analysis...",
            Language::Es => "Iniciando análisis con GPT...",
        }
    }

    pub fn analysis_saved(&self, path: &str) -> String {
        match self.lang {
            Language::De => format!("GPT-Analyse gespeichert unter: {path}"),
            Language::En => format!("GPT analysis saved to: {path}"),
            Language::Es => format!("Análisis GPT guardado en: {path}"),
        }
    }

    pub fn analysis_failed(&self, error: &str) -> String {
        match self.lang {
            Language::De => format!("GPT-Analyse fehlgeschlagen: {error}"),
            Language::En => format!("GPT analysis failed: {error}"),
            Language::Es => format!("Error en el análisis GPT: {error}"),
        }
    }

    pub fn analysis_skipped(&self) -> &'static str {
        match self.lang {
            Language::De => "Überspringe GPT-Analyse – keine Scan-Daten.",
            Language::En => "Skipping GPT analysis – no scan data.",
            Language::Es => "Se omite el análisis con GPT: no hay datos de escaneo.",
        }
    }

    pub fn analysis_no_key(&self) -> &'static str {
        match self.lang {
            Language::De => "Überspringe GPT-Analyse – kein API-Key gesetzt.",
            Language::En => "Skipping GPT analysis – no API key set.",
            Language::Es => "Se omite el análisis con GPT: no hay clave de API configurada.",
        }
    }

    pub fn report_create(&self) -> &'static str {
        match self.lang {
            Language::De => "Erzeuge Sicherheitsreport...",
            Language::En => "Creating security report...",
            Language::Es => "Creando informe de seguridad...",
        }
    }

    pub fn report_saved(&self, path: &str) -> String {
        match self.lang {
            Language::De => format!("Report gespeichert unter: {path}"),
            Language::En => format!("Report saved at: {path}"),
            Language::Es => format!("Informe guardado en: {path}"),
        }
    }

    pub fn report_error(&self, error: &str) -> String {
        match self.lang {
            Language::De => format!("Fehler beim Erstellen des Reports: {error}"),
            Language::En => format!("Error creating report: {error}"),
            Language::Es => format!("Error al crear el informe: {error}"),
        }
    }

    pub fn sysinfo_collect(&self) -> &'static str {
        match self.lang {
            Language::De => "Systeminformationen sammeln...",
            Language::En => "Collecting system information...",
            Language::Es => "Recopilando información del sistema...",
        }
    }

    pub fn demo_try(&self) -> &'static str {
        match self.lang {
            Language::De => "Starte Verbindungs-Demo...",
            Language::En => "Running connectivity demo...",
            Language::Es => "Ejecutando demo de conectividad...",
        }
    }

    pub fn demo_skipped(&self) -> &'static str {
        match self.lang {
            Language::De => "Verbindungs-Demo übersprungen (kein Ziel konfiguriert).",
            Language::En => "Connectivity demo skipped (no target configured).",
            Language::Es => "Demo de conectividad omitida (sin destino configurado).",
        }
    }

    pub fn app_done(&self) -> &'static str {
        match self.lang {
            Language::De => "GhostVenom abgeschlossen.",
            Language::En => "GhostVenom finished.",
            Language::Es => "GhostVenom finalizado.",
        }
    }

    pub fn language_set(&self, lang: Language) -> String {
        match self.lang {
            Language::De => format!("Sprache gesetzt auf: {} ({})", lang.human_name(), lang.code()),
            Language::En => format!("Language set to: {} ({})", lang.human_name(), lang.code()),
            Language::Es => {
                format!("Idioma configurado a: {} ({})", lang.human_name(), lang.code())
            }
        }
    }
}
