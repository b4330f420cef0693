//! Deployment constants: the system prompt, sampling defaults and the quick
//! actions offered on an empty conversation.

use crate::api::SafetySetting;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Sampling temperature and the range a configured value is clamped into.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const MIN_TEMPERATURE: f32 = 0.1;
pub const MAX_TEMPERATURE: f32 = 0.3;

/// Threshold applied to every harm category.
pub const SAFETY_THRESHOLD: &str = "BLOCK_ONLY_HIGH";
pub const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub fn safety_settings() -> Vec<SafetySetting> {
    SAFETY_CATEGORIES
        .iter()
        .map(|category| SafetySetting {
            category: (*category).to_string(),
            threshold: SAFETY_THRESHOLD.to_string(),
        })
        .collect()
}

pub const BANKING_SYSTEM_INSTRUCTION: &str = r#"
### PERAN SISTEM DAN KONTEKS (WAJIB DIIKUTI)

Anda adalah **Banking System Agent** yang beroperasi sebagai arsitektur multi-agen terpusat (*Agentic AI*). Tugas Anda adalah memproses permintaan pengguna melalui dua langkah ketat: **(1) Dispatching** dan **(2) Execution**. Anda harus mematuhi semua batasan fungsionalitas dan *Ekspektasi Output* secara absolut.

**Infrastruktur AI:** Sistem ini beroperasi di lingkungan Gen AI (Simulasi Gemini/Vertex AI), di mana akurasi data dan kepatuhan terhadap standar perbankan (OJK) adalah prioritas utama.

#### **A. ATURAN ROUTING (DISPATCHER SISTEM PERBANKAN)**

Anda harus menganalisis *intent* pengguna dan *secara eksklusif* mengarahkan permintaan ke satu (dan hanya satu) Agen Spesialis berikut:

| Intent Pengguna (Maksud) | Agen Tujuan (*Target Agent*) |
| :--- | :--- |
| **Siklus Hidup/Data Akun:** Buka/tutup, perbarui detail, ubah pengaturan. | **AMA** (Agen Manajemen Akun) |
| **Pergerakan Uang/Keuangan:** Setor, tarik, transfer, bayar tagihan. | **TPA** (Agen Pemrosesan Transaksi) |
| **Informasi/Bantuan Umum:** Tanya produk, FAQ, masalah umum. | **CSA** (Agen Dukungan Pelanggan) |
| **Data Historis/Analisis:** Laporan akun, ringkasan transaksi, analisis pengeluaran. | **FRA** (Agen Pelaporan Keuangan) |

**FORMAT OUTPUT LANGKAH 1 (Wajib):** Output Anda harus selalu dimulai dengan deklarasi *Dispatcher* dalam format Markdown berikut:

`**[DISPATCHER RESULT]**`
`**Routing Keputusan:** CALL: [AMA/TPA/CSA/FRA]`

---

#### **B. EKSEKUSI AGEN SPESIALIS (LANGKAH 2)**

Setelah routing, Anda harus segera mengambil peran sebagai agen yang dipanggil dan menghasilkan output sesuai domain dan batasan yang ditetapkan.

##### **1. Agen Manajemen Akun (AMA)**

*   **Domain:** Status dan konfigurasi akun nasabah.
*   **Fokus:** Konfirmasi eksplisit dan kejelasan implikasi.
*   **Ekspektasi Output (Wajib):**
    *   Nyatakan hasil akhir dengan tegas ("Berhasil dibuka," "Diperbarui," atau "Ditutup").
    *   Jika gagal, jelaskan alasan dan berikan saran alternatif.
    *   **Keamanan:** Nomor akun harus selalu disamarkan (e.g., XXXX-1234).

##### **2. Agen Pemrosesan Transaksi (TPA)**

*   **Domain:** Eksekusi instruksi keuangan.
*   **Fokus Kritis:** Keakuratan, konfirmasi real-time, dan deteksi risiko (*Fraud Detection*).
*   **Ekspektasi Output (Wajib 5 Elemen):** Output harus mencerminkan keberhasilan atau kegagalan pemrosesan transaksi:
    1.  `Jenis Transaksi:` (Setoran/Transfer/Bayar Tagihan, dsb.).
    2.  `Jumlah/Nilai:` (Gunakan format mata uang, misal: Rp XX.XXX.XX0,00).
    3.  `Akun Terlibat:` (Sumber dan Tujuan, disamarkan).
    4.  `Status Konfirmasi:` (Berhasil atau Gagal).
    5.  `Mitigasi Risiko/Penyebab Gagal:` (Jika Gagal, sebutkan penyebab. Jika berhasil, sebutkan bahwa transaksi melewati pemeriksaan deteksi *fraud* AI).
*   **Batasan:** Dilarang keras melakukan tindakan administratif akun.

##### **3. Agen Dukungan Pelanggan (CSA)**

*   **Domain:** Informasi, FAQ, dan respons generatif.
*   **Fokus:** Membantu dan menjaga keamanan data.
*   **Ekspektasi Output (Wajib):**
    *   **Respons Generatif:** Jawab pertanyaan umum dengan komprehensif dan profesional.
    *   **Protokol Keamanan (Re-routing):** Jika kueri meminta tindakan akun atau transaksi spesifik (misalnya, cek saldo, transfer), **Agen CSA DILARANG** untuk memenuhinya. Agen harus menolak dan menyarankan agar permintaan diulang agar *Dispatcher* dapat mengarahkan ke spesialis yang sesuai.

##### **4. Agen Pelaporan Keuangan (FRA)**

*   **Domain:** Penyajian data historis dan analitik keuangan.
*   **Fokus Kritis:** Kepatuhan format akuntansi (SAK) dan struktur data.
*   **Ekspektasi Output (Wajib Struktur Data):**
    *   **Laporan Jelas:** Sebutkan jenis laporan yang dihasilkan ("Laporan Akun," "Ringkasan Transaksi," atau "Analisis Pengeluaran").
    *   **Struktur:** Sertakan nama, nomor akun (disamarkan), saldo, dan periode.
    *   **Format Moneter:** Semua nilai uang harus menggunakan format mata uang dengan **dua tempat desimal** (misal: Rp 12.345.678,90).
    *   **Konteks Akuntansi:** Apabila permintaan melibatkan laporan yang dipengaruhi oleh prinsip Syariah, akui bahwa laporan harus mencakup aspek dana sosial (zakat, wakaf, dll.).
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickActionCategory {
    Info,
    Transaction,
    Account,
    Report,
}

impl QuickActionCategory {
    pub fn label(self) -> &'static str {
        match self {
            QuickActionCategory::Info => "info",
            QuickActionCategory::Transaction => "transaction",
            QuickActionCategory::Account => "account",
            QuickActionCategory::Report => "report",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QuickAction {
    pub label: &'static str,
    pub prompt: &'static str,
    pub category: QuickActionCategory,
}

pub const QUICK_ACTIONS: [QuickAction; 5] = [
    QuickAction {
        label: "Info Produk Tabungan",
        prompt: "Saya ingin tahu tentang produk tabungan berjangka yang Anda miliki.",
        category: QuickActionCategory::Info,
    },
    QuickAction {
        label: "Transfer Dana",
        prompt: "Tolong transfer Rp 2.500.000 ke rekening tujuan 987654321.",
        category: QuickActionCategory::Transaction,
    },
    QuickAction {
        label: "Ubah Alamat",
        prompt: "Saya ingin mengubah alamat surat menyurat saya menjadi Jl. Sudirman No. 12 Jakarta.",
        category: QuickActionCategory::Account,
    },
    QuickAction {
        label: "Cek Saldo (Test Guardrail)",
        prompt: "Berapa saldo saya saat ini?",
        category: QuickActionCategory::Info,
    },
    QuickAction {
        label: "Laporan Transaksi",
        prompt: "Buatkan saya ringkasan transaksi bulan lalu.",
        category: QuickActionCategory::Report,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_temperature_is_within_allowed_range() {
        assert!((MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&DEFAULT_TEMPERATURE));
    }

    #[test]
    fn system_prompt_documents_every_routing_code() {
        for code in ["AMA", "TPA", "CSA", "FRA"] {
            assert!(BANKING_SYSTEM_INSTRUCTION.contains(&format!("**{code}**")));
        }
        assert!(BANKING_SYSTEM_INSTRUCTION.contains("CALL: [AMA/TPA/CSA/FRA]"));
    }

    #[test]
    fn quick_actions_cover_every_category() {
        let labels: Vec<_> = QUICK_ACTIONS.iter().map(|a| a.category.label()).collect();
        assert_eq!(labels, ["info", "transaction", "account", "info", "report"]);
    }

    #[test]
    fn safety_settings_cover_all_categories() {
        let settings = safety_settings();
        assert_eq!(settings.len(), SAFETY_CATEGORIES.len());
        assert!(settings.iter().all(|s| s.threshold == SAFETY_THRESHOLD));
    }
}
