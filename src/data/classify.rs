//! Classification Module
//! Derived fields: earmark type and collapsed application modality.

/// Primary-result codes that identify earmarks.
const RP_INDIVIDUAL: i64 = 6;
const RP_BANCADA: i64 = 7;
const RP_COMISSAO: i64 = 8;

/// Action code used by individual "special transfer" (Pix) earmarks.
const PIX_ACTION_CODE: &str = "0EC2";

/// Earmark type (`tipo_emenda`). Variant order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EarmarkType {
    Bancada,
    Comissao,
    IndividualDefinida,
    IndividualPix,
}

impl EarmarkType {
    pub const ALL: [EarmarkType; 4] = [
        EarmarkType::Bancada,
        EarmarkType::Comissao,
        EarmarkType::IndividualDefinida,
        EarmarkType::IndividualPix,
    ];

    /// Classify a row from its primary-result and action codes.
    pub fn classify(primary_result_code: Option<i64>, action_code: &str) -> Option<Self> {
        match primary_result_code? {
            RP_BANCADA => Some(EarmarkType::Bancada),
            RP_COMISSAO => Some(EarmarkType::Comissao),
            RP_INDIVIDUAL if action_code.trim() == PIX_ACTION_CODE => {
                Some(EarmarkType::IndividualPix)
            }
            RP_INDIVIDUAL => Some(EarmarkType::IndividualDefinida),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EarmarkType::Bancada => "Bancada",
            EarmarkType::Comissao => "Comissão",
            EarmarkType::IndividualDefinida => "Individual - finalidade definida",
            EarmarkType::IndividualPix => "Individual - transferência especial (Pix)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

/// Display order of the collapsed modalities.
pub const MODALITY_ORDER: [&str; 8] = [
    "Transf. Estados e DF",
    "Transf. a Municípios",
    "Transf. Estados e DF - F/F",
    "Transf. a Municípios - F/F",
    "Transf. a Inst. Priv. s/ fins lucr",
    "Aplicações Diretas",
    "Outras",
    "A definir",
];

pub const OTHER_MODALITY: &str = "Outras";

const MODALITY_RENAMES: [(&str, &str); 6] = [
    (
        "Transferências a Estados e ao Distrito Federal",
        "Transf. Estados e DF",
    ),
    (
        "Transferências a Estados e ao Distrito Federal - Fundo a Fundo",
        "Transf. Estados e DF - F/F",
    ),
    ("Transferências a Municípios", "Transf. a Municípios"),
    (
        "Transferências a Municípios - Fundo a Fundo",
        "Transf. a Municípios - F/F",
    ),
    (
        "Transferências a Instituições Privadas sem Fins Lucrativos",
        "Transf. a Inst. Priv. s/ fins lucr",
    ),
    ("A DEFINIR", "A definir"),
];

const MODALITIES_COLLAPSED: [&str; 6] = [
    "Aplicação Direta Decorrente de Operação entre Órgãos, Fundos e Entidades Integrantes dos Orçamentos F/S",
    "Execução Orçamentária Delegada a Estados e ao Distrito Federal",
    "Execução Orçamentária Delegada a Municípios",
    "Transferências a Consórcios Públicos mediante contrato de rateio",
    "Transferências a Instituições Multigovernamentais Nacionais",
    "Transferências ao Exterior",
];

/// Rename a modality description, collapsing rare ones into `Outras`.
/// Unknown descriptions pass through unchanged.
pub fn remap_modality(desc: &str) -> String {
    if let Some((_, short)) = MODALITY_RENAMES.iter().find(|(long, _)| *long == desc) {
        return short.to_string();
    }
    if MODALITIES_COLLAPSED.contains(&desc) {
        return OTHER_MODALITY.to_string();
    }
    desc.to_string()
}

/// Position of a modality in display order; unknown modalities sort last.
pub fn modality_rank(modality: &str) -> usize {
    MODALITY_ORDER
        .iter()
        .position(|m| *m == modality)
        .unwrap_or(MODALITY_ORDER.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_primary_result() {
        assert_eq!(
            EarmarkType::classify(Some(7), "1234"),
            Some(EarmarkType::Bancada)
        );
        assert_eq!(
            EarmarkType::classify(Some(8), "0EC2"),
            Some(EarmarkType::Comissao)
        );
        assert_eq!(
            EarmarkType::classify(Some(6), "0EC2"),
            Some(EarmarkType::IndividualPix)
        );
        assert_eq!(
            EarmarkType::classify(Some(6), "2000"),
            Some(EarmarkType::IndividualDefinida)
        );
        assert_eq!(EarmarkType::classify(Some(2), "0EC2"), None);
        assert_eq!(EarmarkType::classify(None, "0EC2"), None);
    }

    #[test]
    fn labels_round_trip_in_display_order() {
        let labels: Vec<&str> = EarmarkType::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Bancada",
                "Comissão",
                "Individual - finalidade definida",
                "Individual - transferência especial (Pix)",
            ]
        );
        for t in EarmarkType::ALL {
            assert_eq!(EarmarkType::from_label(t.label()), Some(t));
        }
        assert_eq!(EarmarkType::from_label("Relator"), None);

        let mut sorted = EarmarkType::ALL;
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted, EarmarkType::ALL);
    }

    #[test]
    fn remaps_and_collapses_modalities() {
        assert_eq!(
            remap_modality("Transferências a Municípios - Fundo a Fundo"),
            "Transf. a Municípios - F/F"
        );
        assert_eq!(remap_modality("A DEFINIR"), "A definir");
        assert_eq!(remap_modality("Transferências ao Exterior"), "Outras");
        assert_eq!(
            remap_modality("Execução Orçamentária Delegada a Municípios"),
            "Outras"
        );
        assert_eq!(remap_modality("Aplicações Diretas"), "Aplicações Diretas");
        assert_eq!(remap_modality("Algo Novo"), "Algo Novo");
    }

    #[test]
    fn unknown_modalities_rank_last() {
        assert_eq!(modality_rank("Transf. Estados e DF"), 0);
        assert_eq!(modality_rank("A definir"), 7);
        assert_eq!(modality_rank("Algo Novo"), MODALITY_ORDER.len());
    }
}
