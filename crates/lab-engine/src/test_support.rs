//! Shared test utilities for lab-engine unit tests.

pub(crate) mod helpers {
    use lab_core::entities::ExamDefinition;
    use lab_core::enums::DataType;

    use crate::inputs::{DefinitionInput, FieldInput};
    use crate::service::LabService;

    /// A fresh service with default settings.
    pub fn test_service() -> LabService {
        LabService::default()
    }

    /// Simple fasting glucose: one required numeric field with a 70-110 range.
    pub fn glucose() -> DefinitionInput {
        DefinitionInput::simple("GLU", "Glucosa").field(
            FieldInput::new("Glucosa", DataType::Number)
                .unit("mg/dL")
                .reference("70-110")
                .section("Bioquímica")
                .required(),
        )
    }

    /// Urine sediment: a simple child with one required field.
    pub fn sediment() -> DefinitionInput {
        DefinitionInput::simple("SED", "Sedimento urinario").field(
            FieldInput::new("Leucocitos", DataType::Number)
                .unit("/campo")
                .reference("0-5")
                .section("Microscópico")
                .required(),
        )
    }

    /// Store a hybrid urinalysis with a required own field and a sediment child.
    /// Returns `(hybrid, child)`.
    pub fn seed_urinalysis(svc: &LabService) -> (ExamDefinition, ExamDefinition) {
        let child = svc.create_definition(sediment()).unwrap();
        let hybrid = svc
            .create_definition(
                DefinitionInput::hybrid("EGO", "Examen general de orina")
                    .field(
                        FieldInput::new("Color", DataType::Select)
                            .options(["Amarillo", "Ámbar", "Rojizo"])
                            .reference("Amarillo")
                            .section("Físico")
                            .required(),
                    )
                    .field(FieldInput::new("Observación", DataType::Longtext))
                    .child(child.id),
            )
            .unwrap();
        (hybrid, child)
    }
}
