//! Prompt templates for Colaborai.
//!
//! Prompts can be customized by placing an `agent.toml` file in the custom
//! prompts directory. Templates may reference `{{variable}}` placeholders that
//! are filled from the `[prompts.variables]` config table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts used by the tool-calling agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// Fixed system instruction: response language and citation policy.
    pub system: String,
    /// Rubric embedded verbatim in every exercise payload.
    pub exercise_instructions: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"Você é um assistente que responde perguntas sobre os documentos carregados na base de conhecimento. IMPORTANTE: SEMPRE responda em {{language}}. Todas as suas respostas devem estar nesse idioma.

Quando a informação depende do conteúdo recuperado dos documentos, inclua citações concisas às partes específicas do documento (nome do arquivo e número da página). Apenas adicione citações quando elas suportam materialmente a resposta ou são diretamente relevantes; evite citações para observações triviais ou especulativas. Se você citar ou parafrasear um trecho recuperado, anexe uma citação curta entre parênteses após a sentença relevante (formato: (source: <filename>, page: <n>)).

Ao usar a {{exercise_tool}}, siga cuidadosamente as instruções fornecidas na resposta da ferramenta. Crie exercícios de DIFICULDADE MÉDIA que foquem em CONCEITOS IMPORTANTES dos artigos. Sempre inclua uma seção 'GABARITO' no final com respostas completas e explicativas que referenciem os artigos quando aplicável."#
                .to_string(),

            exercise_instructions: r#"Você deve criar exercícios de fixação PERSONALIZADOS E BEM ESTRUTURADOS para cada participante.

## DIRETRIZES OBRIGATÓRIAS:

### 1. QUALIDADE DAS QUESTÕES
- Crie 2-3 exercícios por participante (não mais que isso)
- FOQUE em conceitos-chave, metodologias, resultados e implicações dos artigos
- EVITE perguntas triviais (ex: 'Qual o título do artigo?')
- EVITE perguntas impossíveis de responder com o conteúdo fornecido
- Dificuldade MEDIANA: requer compreensão, não apenas memorização

### 2. TIPOS DE QUESTÕES (varie entre estes):
- **Compreensão**: Explicar conceitos apresentados nos artigos
- **Comparação**: Relacionar ideias de diferentes artigos ou seções
- **Aplicação**: Como aplicar os conceitos em situações práticas
- **Análise crítica**: Avaliar metodologias, limitações ou implicações
- **Síntese**: Integrar múltiplas ideias dos artigos

### 3. CONTEXTUALIZAÇÃO
- USE os tópicos recentemente discutidos para criar questões relevantes
- REFERENCIE explicitamente os artigos (nome e página) nas questões
- CONECTE as questões com o que foi conversado no chat

### 4. DIVERSIDADE
- Distribua questões entre diferentes artigos quando possível
- Varie os tipos de questões para cada participante
- Personalize levemente para cada pessoa (baseado em suas mensagens anteriores, se houver)

## FORMATO DE SAÍDA OBRIGATÓRIO:

### EXERCÍCIOS DE FIXAÇÃO
**Tópico:** [tópico]

#### Exercícios para [Nome do Participante 1]
1. [Questão 1]
2. [Questão 2]
[Repetir para cada participante]
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The rendered system instruction. `language` defaults to Brazilian
    /// Portuguese unless overridden by a config variable.
    pub fn system_instruction(&self, exercise_tool: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("exercise_tool".to_string(), exercise_tool.to_string());
        if !self.variables.contains_key("language") {
            vars.insert("language".to_string(), "PORTUGUÊS (português brasileiro)".to_string());
        }
        self.render_with_custom(&self.agent.system, &vars)
    }

    /// The rendered exercise rubric.
    pub fn exercise_instructions(&self) -> String {
        self.render_with_custom(&self.agent.exercise_instructions, &HashMap::new())
    }
}
