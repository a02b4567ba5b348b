use clap::ValueEnum;

/// Target language for translations and summaries.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    Ja,
    En,
}

impl Lang {
    pub fn translate_prompt(self, text: &str) -> String {
        let instruction = match self {
            Lang::Ja => {
                "次の文章を自然な日本語に翻訳してください。要約はせず、元の文章の情報をすべて含めてください。"
            }
            Lang::En => {
                "Translate the following text into natural English. Do not summarize; keep every piece of information from the original."
            }
        };
        format!("{instruction}\n\n{text}")
    }

    pub fn summarize_prompt(self, text: &str) -> String {
        let instruction = match self {
            Lang::Ja => "次のPubMed論文のアブストラクトを日本語で100文字以内に要約してください。",
            Lang::En => {
                "Summarize the following PubMed abstract in English in 100 characters or fewer."
            }
        };
        format!("{instruction}\n\n{text}")
    }
}
